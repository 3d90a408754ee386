use thiserror::Error;

use crate::classify::{classify, metallic_for};
use crate::description::{ShaderBody, ShaderDescription, TextureChannel};
use crate::material::{ChannelUsage, HostMaterial, TextureExtractor};

#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("Material '{name}' could not be evaluated")]
    Unevaluable { name: String },
}

/// Blend amount for a host percentage, capped at full strength.
pub fn blend_amount(percent: f32) -> f32 {
    (percent / 100.0).clamp(0.0, 1.0)
}

/// Converts host materials into shader descriptions.
///
/// Stateless apart from the texture-extraction collaborator; one translator
/// can serve any number of materials.
pub struct ShaderTranslator<'a> {
    textures: &'a dyn TextureExtractor,
}

impl<'a> ShaderTranslator<'a> {
    pub fn new(textures: &'a dyn TextureExtractor) -> Self {
        Self { textures }
    }

    pub fn translate(
        &self,
        material: &dyn HostMaterial,
        gamma: f32,
    ) -> Result<ShaderDescription, TranslateError> {
        if let Some(native) = material.native() {
            log::debug!("'{}' carries a native shader; baking", material.name());
            native.bake_parameters();
            return Ok(ShaderDescription::native(material.name(), native, gamma));
        }

        let front = self.translate_body(material)?;
        let back = match material.back_material() {
            Some(back_material) => match self.translate_body(back_material.as_ref()) {
                Ok(body) => body,
                Err(e) => {
                    log::warn!("{}; using front side for back faces", e);
                    front.clone()
                }
            },
            None => front.clone(),
        };

        log::info!(
            "Translated '{}' as {} (back: {})",
            front.name,
            front.archetype,
            back.archetype
        );
        Ok(ShaderDescription::new(front, back, gamma))
    }

    fn translate_body(&self, material: &dyn HostMaterial) -> Result<ShaderBody, TranslateError> {
        let sim = material.simulate().ok_or_else(|| TranslateError::Unevaluable {
            name: material.name().to_string(),
        })?;

        let mut body = ShaderBody {
            name: material.name().to_string(),
            diffuse: sim.diffuse,
            specular: sim.specular,
            reflection: sim.reflection,
            transmission: sim.transparent,
            emission: sim.emission,
            roughness: sim.roughness,
            ior: sim.ior,
            fresnel_enabled: sim.fresnel_enabled,
            fresnel_ior: sim.fresnel_ior,
            reflectivity: sim.reflectivity,
            transparency: sim.transparency,
            shine: sim.shine,
            gloss: sim.gloss,
            shadeless: sim.shadeless,
            alpha_transparency: sim.alpha_transparency,
            ..Default::default()
        };

        for usage in ChannelUsage::ALL {
            let channel = self.convert_channel(material, usage);
            match usage {
                ChannelUsage::Diffuse => body.diffuse_texture = channel,
                ChannelUsage::Bump => body.bump_texture = channel,
                ChannelUsage::Transparency => body.transparency_texture = channel,
                ChannelUsage::Environment => body.environment_texture = channel,
            }
        }

        body.archetype = classify(&material.kind(), &body);
        body.metallic = metallic_for(body.archetype);
        Ok(body)
    }

    fn convert_channel(&self, material: &dyn HostMaterial, usage: ChannelUsage) -> TextureChannel {
        let slot = material.channel(usage);
        if !slot.enabled {
            return TextureChannel::default();
        }
        let image = match self.textures.extract(material, usage) {
            Some(image) if image.is_usable() => image,
            _ => {
                log::debug!("No usable {:?} texture on '{}'", usage, material.name());
                return TextureChannel::default();
            }
        };
        let use_alpha = usage == ChannelUsage::Diffuse && slot.use_alpha && image.has_alpha;
        TextureChannel {
            amount: blend_amount(slot.amount_percent),
            use_alpha,
            image: Some(image),
        }
    }
}
