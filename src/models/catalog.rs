use super::validation::{self, FieldErrors};
use crate::constants::limits;

/// A tag accepted for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTag {
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl NewTag {
    pub fn parse(name: &str, color: &str, slug: &str) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = validation::text(&mut errors, "name", name, limits::MAX_NAME_LENGTH);

        let color = color.trim();
        if !validation::is_hex_color(color) {
            errors.add("color", "Enter a valid hex color, e.g. #E26C2D.");
        }

        let slug = validation::text(&mut errors, "slug", slug, limits::MAX_SLUG_LENGTH).filter(
            |slug| {
                let ok = validation::is_slug(slug);
                if !ok {
                    errors.add("slug", "Letters, digits, hyphens and underscores only.");
                }
                ok
            },
        );

        match (name, slug) {
            (Some(name), Some(slug)) if errors.is_empty() => Ok(Self {
                name,
                color: color.to_uppercase(),
                slug,
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIngredient {
    pub name: String,
    pub measurement_unit: String,
}

impl NewIngredient {
    pub fn parse(name: &str, measurement_unit: &str) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = validation::text(&mut errors, "name", name, limits::MAX_NAME_LENGTH);
        let measurement_unit = validation::text(
            &mut errors,
            "measurement_unit",
            measurement_unit,
            limits::MAX_NAME_LENGTH,
        );

        match (name, measurement_unit) {
            (Some(name), Some(measurement_unit)) => Ok(Self {
                name,
                measurement_unit,
            }),
            _ => Err(errors),
        }
    }
}
