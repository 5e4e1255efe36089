//! Shape archetypes the particle field can morph into.

use serde::{Deserialize, Serialize};
use zenparticles_derive::ShapeTag;

/// Named shape category a particle field can target.
///
/// The four procedural archetypes are generated locally. The two generated
/// archetypes show a sphere placeholder until a shape service delivers
/// points for them.
///
/// Ids follow declaration order; unknown ids resolve to
/// [`ShapeArchetype::Fireworks`]:
///
/// ```ignore
/// assert_eq!(ShapeArchetype::from(2u32), ShapeArchetype::Saturn);
/// assert_eq!(ShapeArchetype::from(99u32), ShapeArchetype::Fireworks);
/// assert_eq!("buddha (ai)".parse(), Ok(ShapeArchetype::AiPrimary));
/// ```
#[derive(ShapeTag, Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShapeArchetype {
    #[default]
    Heart,
    Flower,
    Saturn,
    #[tag(fallback)]
    Fireworks,
    #[tag(label = "Buddha (AI)")]
    AiPrimary,
    #[tag(label = "Custom AI")]
    AiCustom,
}

impl ShapeArchetype {
    /// Archetypes with a local generator.
    pub const PROCEDURAL: [ShapeArchetype; 4] = [
        ShapeArchetype::Heart,
        ShapeArchetype::Flower,
        ShapeArchetype::Saturn,
        ShapeArchetype::Fireworks,
    ];

    /// Whether this archetype is backed by a shape service.
    #[inline]
    pub fn is_generated(self) -> bool {
        matches!(self, ShapeArchetype::AiPrimary | ShapeArchetype::AiCustom)
    }

    /// Prompt submitted by the one-click loader of this archetype, if any.
    pub fn preset_prompt(self) -> Option<&'static str> {
        match self {
            ShapeArchetype::AiPrimary => Some("Buddha Statue"),
            _ => None,
        }
    }

    /// Slot index used by per-archetype tables.
    #[inline]
    pub(crate) fn slot(self) -> usize {
        u32::from(self) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_follow_declaration_order() {
        assert_eq!(u32::from(ShapeArchetype::Heart), 0);
        assert_eq!(u32::from(ShapeArchetype::AiCustom), 5);
        assert_eq!(ShapeArchetype::count(), 6);
        assert_eq!(ShapeArchetype::ALL.len(), 6);
    }

    #[test]
    fn test_unknown_id_falls_back_to_fireworks() {
        assert_eq!(ShapeArchetype::from(6u32), ShapeArchetype::Fireworks);
        assert_eq!(ShapeArchetype::from(u32::MAX), ShapeArchetype::Fireworks);
    }

    #[test]
    fn test_labels_and_parsing() {
        assert_eq!(ShapeArchetype::AiPrimary.to_string(), "Buddha (AI)");
        assert_eq!("custom ai".parse::<ShapeArchetype>(), Ok(ShapeArchetype::AiCustom));
        assert_eq!("ai-primary".parse::<ShapeArchetype>(), Ok(ShapeArchetype::AiPrimary));
        assert_eq!("SATURN".parse::<ShapeArchetype>(), Ok(ShapeArchetype::Saturn));
        assert!("dragon".parse::<ShapeArchetype>().is_err());
    }

    #[test]
    fn test_generated_split() {
        for shape in ShapeArchetype::PROCEDURAL {
            assert!(!shape.is_generated());
        }
        assert!(ShapeArchetype::AiPrimary.is_generated());
        assert!(ShapeArchetype::AiCustom.is_generated());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&ShapeArchetype::AiCustom).unwrap();
        assert_eq!(json, "\"ai-custom\"");
        let back: ShapeArchetype = serde_json::from_str("\"flower\"").unwrap();
        assert_eq!(back, ShapeArchetype::Flower);
    }
}
