//! Archetype classification.
//!
//! A declared material type always wins. Only when the type is unknown are
//! the "smells like" heuristics in [`RULES`] tried, top to bottom; the first
//! match decides. Nothing matching means [`Archetype::Custom`].

use crate::description::{Archetype, ShaderBody};
use crate::material::MaterialKind;

/// IOR at which a clear transparent material stops reading as glass.
const GEM_MIN_IOR: f32 = 1.7;
const MIRROR_GLOSS: f32 = 0.999;

/// One heuristic: a named predicate and the archetype it implies.
pub struct Rule {
    pub name: &'static str,
    pub archetype: Archetype,
    pub matches: fn(&ShaderBody) -> bool,
}

/// Heuristics in priority order. Same order as the exact-type table:
/// picture, plaster, glass, gem, paint, plastic, metal.
pub const RULES: &[Rule] = &[
    Rule {
        name: "picture",
        archetype: Archetype::Picture,
        matches: smells_like_picture,
    },
    Rule {
        name: "plaster",
        archetype: Archetype::Plaster,
        matches: smells_like_plaster,
    },
    Rule {
        name: "textured plaster",
        archetype: Archetype::Plaster,
        matches: smells_like_textured_plaster,
    },
    Rule {
        name: "glass",
        archetype: Archetype::Glass,
        matches: smells_like_glass,
    },
    Rule {
        name: "gem",
        archetype: Archetype::Gem,
        matches: smells_like_gem,
    },
    Rule {
        name: "paint",
        archetype: Archetype::Paint,
        matches: smells_like_paint,
    },
    Rule {
        name: "plastic",
        archetype: Archetype::Plastic,
        matches: smells_like_plastic,
    },
    Rule {
        name: "textured plastic",
        archetype: Archetype::Plastic,
        matches: smells_like_textured_plastic,
    },
    Rule {
        name: "metal",
        archetype: Archetype::Metal,
        matches: smells_like_metal,
    },
];

/// Archetype for a declared material type, if it is one of the known ones.
pub fn exact_archetype(kind: &MaterialKind) -> Option<Archetype> {
    match kind {
        MaterialKind::Picture => Some(Archetype::Picture),
        MaterialKind::Plaster => Some(Archetype::Plaster),
        MaterialKind::Glass => Some(Archetype::Glass),
        MaterialKind::Gem => Some(Archetype::Gem),
        MaterialKind::Paint => Some(Archetype::Paint),
        MaterialKind::Plastic => Some(Archetype::Plastic),
        MaterialKind::Metal => Some(Archetype::Metal),
        MaterialKind::Other(_) => None,
    }
}

pub fn classify(kind: &MaterialKind, body: &ShaderBody) -> Archetype {
    if let Some(archetype) = exact_archetype(kind) {
        log::debug!("'{}' declared as {}", body.name, archetype);
        return archetype;
    }
    match RULES.iter().find(|rule| (rule.matches)(body)) {
        Some(rule) => {
            log::debug!("'{}' smells like {}", body.name, rule.name);
            rule.archetype
        }
        None => {
            log::debug!("'{}' matched no archetype", body.name);
            Archetype::Custom
        }
    }
}

/// 1.0 for metal, 0.0 for everything else.
pub fn metallic_for(archetype: Archetype) -> f32 {
    if archetype == Archetype::Metal {
        1.0
    } else {
        0.0
    }
}

// ── Heuristics ───────────────────────────────────────────────────────

fn smells_like_picture(body: &ShaderBody) -> bool {
    body.shadeless && body.has_diffuse_texture()
}

fn smells_like_plaster(body: &ShaderBody) -> bool {
    body.diffuse_only() && !body.has_diffuse_texture()
}

fn smells_like_textured_plaster(body: &ShaderBody) -> bool {
    body.diffuse_only() && body.has_diffuse_texture()
}

fn clear_transparent(body: &ShaderBody) -> bool {
    body.has_transparency()
        && !body.has_emission()
        && !body.shadeless
        && !body.has_transparency_texture()
        && !body.has_diffuse_texture()
}

fn smells_like_glass(body: &ShaderBody) -> bool {
    clear_transparent(body) && body.ior < GEM_MIN_IOR
}

fn smells_like_gem(body: &ShaderBody) -> bool {
    clear_transparent(body) && body.ior >= GEM_MIN_IOR
}

/// Fresnel-reflective and opaque, no maps besides diffuse.
fn dielectric_coat(body: &ShaderBody) -> bool {
    body.is_opaque_lit()
        && body.fresnel_enabled
        && body.has_reflectivity()
        && !body.has_bump_texture()
        && !body.has_environment_texture()
}

fn smells_like_paint(body: &ShaderBody) -> bool {
    dielectric_coat(body) && body.gloss >= MIRROR_GLOSS
}

fn smells_like_plastic(body: &ShaderBody) -> bool {
    dielectric_coat(body) && body.gloss < MIRROR_GLOSS && !body.has_diffuse_texture()
}

fn smells_like_textured_plastic(body: &ShaderBody) -> bool {
    dielectric_coat(body) && body.gloss < MIRROR_GLOSS && body.has_diffuse_texture()
}

fn smells_like_metal(body: &ShaderBody) -> bool {
    body.reflection_only() && !body.fresnel_enabled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::TextureChannel;
    use crate::material::TextureImage;
    use prism_core::Rgba;

    fn unknown() -> MaterialKind {
        MaterialKind::Other("custom-type".to_string())
    }

    fn plastic_like() -> ShaderBody {
        ShaderBody {
            name: "shiny".to_string(),
            diffuse: Rgba::rgb(0.8, 0.1, 0.1),
            reflectivity: 0.3,
            fresnel_enabled: true,
            gloss: 0.6,
            ..Default::default()
        }
    }

    #[test]
    fn test_exact_type_beats_heuristics() {
        let body = plastic_like();
        assert_eq!(classify(&unknown(), &body), Archetype::Plastic);
        assert_eq!(classify(&MaterialKind::Metal, &body), Archetype::Metal);
    }

    #[test]
    fn test_unrecognized_is_custom() {
        let body = ShaderBody {
            emission: Rgba::rgb(1.0, 1.0, 1.0),
            bump_texture: TextureChannel {
                image: Some(TextureImage::new("bump", 8, 8)),
                amount: 1.0,
                use_alpha: false,
            },
            ..Default::default()
        };
        assert_eq!(classify(&unknown(), &body), Archetype::Custom);
    }

    #[test]
    fn test_plain_diffuse_is_plaster() {
        let body = ShaderBody {
            diffuse: Rgba::rgb(0.7, 0.7, 0.7),
            ..Default::default()
        };
        assert_eq!(classify(&unknown(), &body), Archetype::Plaster);
    }

    #[test]
    fn test_glass_and_gem_split_on_ior() {
        let mut body = ShaderBody {
            transparency: 0.9,
            ior: 1.52,
            ..Default::default()
        };
        assert_eq!(classify(&unknown(), &body), Archetype::Glass);
        body.ior = 2.42;
        assert_eq!(classify(&unknown(), &body), Archetype::Gem);
    }

    #[test]
    fn test_mirror_gloss_reads_as_paint() {
        let mut body = plastic_like();
        body.gloss = 1.0;
        assert_eq!(classify(&unknown(), &body), Archetype::Paint);
    }

    #[test]
    fn test_reflective_without_fresnel_is_metal() {
        let body = ShaderBody {
            reflectivity: 0.9,
            reflection: Rgba::rgb(0.9, 0.8, 0.5),
            ..Default::default()
        };
        assert_eq!(classify(&unknown(), &body), Archetype::Metal);
    }

    #[test]
    fn test_rule_order_matches_exact_table() {
        let order: Vec<Archetype> = RULES.iter().map(|r| r.archetype).collect();
        let mut deduped = order.clone();
        deduped.dedup();
        assert_eq!(
            deduped,
            vec![
                Archetype::Picture,
                Archetype::Plaster,
                Archetype::Glass,
                Archetype::Gem,
                Archetype::Paint,
                Archetype::Plastic,
                Archetype::Metal,
            ]
        );
    }

    #[test]
    fn test_metallic_only_for_metal() {
        assert_eq!(metallic_for(Archetype::Metal), 1.0);
        assert_eq!(metallic_for(Archetype::Plastic), 0.0);
        assert_eq!(metallic_for(Archetype::Custom), 0.0);
    }
}
