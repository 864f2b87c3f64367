//! Synthetic pins for demo mode, plus the fixed category and trending lists.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use crate::models::Pin;

pub const CATEGORIES: [&str; 12] = [
    "Arte",
    "Diseño",
    "UI/UX",
    "Arquitectura",
    "Fotografía",
    "Ilustración",
    "Moda",
    "Tecnología",
    "Cocina",
    "Viajes",
    "Naturaleza",
    "Minimalismo",
];

pub const TRENDING: [&str; 9] = [
    "Neon",
    "Cinemático",
    "Manga",
    "Tipografía",
    "Isométrico",
    "Brutalismo",
    "Retro",
    "Futurismo",
    "Lowpoly",
];

pub const DEMO_AUTHOR: &str = "Anónimo";
const DEMO_DESC: &str =
    "Inspiración visual generada para la demo. Usa subir para añadir tus propias imágenes.";
const DAY_MS: i64 = 86_400_000;

pub fn is_known_category(cat: &str) -> bool {
    CATEGORIES.contains(&cat)
}

pub fn new_pin_id() -> String {
    Uuid::now_v7().to_string()
}

pub struct DemoGenerator {
    rng: StdRng,
}

impl DemoGenerator {
    pub fn new() -> Self {
        Self { rng: StdRng::from_entropy() }
    }

    /// Deterministic image seeds, sizes and categories (ids stay unique).
    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    /// `count` pins numbered from `offset + 1`, created within the last day.
    pub fn batch(&mut self, count: usize, offset: usize, now_ms: i64) -> Vec<Pin> {
        (0..count).map(|i| self.pin(offset + i, now_ms)).collect()
    }

    fn pin(&mut self, index: usize, now_ms: i64) -> Pin {
        let w = self.rng.gen_range(400..800);
        let h = self.rng.gen_range(500..1100);
        let seed = index + self.rng.gen_range(0..9999);
        let cat = CATEGORIES.choose(&mut self.rng).copied().unwrap_or(CATEGORIES[0]);
        let trend = TRENDING.choose(&mut self.rng).copied().unwrap_or(TRENDING[0]);

        Pin {
            id: new_pin_id(),
            src: format!("https://picsum.photos/seed/{seed}/{w}/{h}"),
            w,
            h,
            title: format!("Idea #{}", index + 1),
            desc: DEMO_DESC.to_string(),
            author: DEMO_AUTHOR.to_string(),
            cat: cat.to_string(),
            tags: vec![trend.to_string(), cat.to_lowercase()],
            created_at: now_ms - self.rng.gen_range(0..DAY_MS),
        }
    }
}

impl Default for DemoGenerator {
    fn default() -> Self {
        Self::new()
    }
}
