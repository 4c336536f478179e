//! Static source-of-truth lists for the catalog base entities.
//!
//! Names are fixed here; descriptions are generated at seed time. The
//! material taxonomy slugs line up with the keyword-inference table so
//! a healed material creation always finds its category.

pub struct SubCategorySeed {
    pub slug: &'static str,
    pub name_en: &'static str,
    pub name_ar: &'static str,
}

pub struct CategorySeed {
    pub slug: &'static str,
    pub name_en: &'static str,
    pub name_ar: &'static str,
    pub subs: &'static [SubCategorySeed],
}

pub struct ApproachSeed {
    pub slug: &'static str,
    pub name_en: &'static str,
    pub name_ar: &'static str,
}

pub struct ColorSeed {
    pub slug: &'static str,
    pub name_en: &'static str,
    pub name_ar: &'static str,
    pub hex: &'static str,
    pub group: &'static str,
}

pub struct RoomTypeSeed {
    pub slug: &'static str,
    pub name_en: &'static str,
    pub name_ar: &'static str,
}

pub struct TaxonomySeed {
    pub slug: &'static str,
    pub name_en: &'static str,
    pub name_ar: &'static str,
}

pub const CATEGORIES: &[CategorySeed] = &[
    CategorySeed {
        slug: "classic",
        name_en: "Classic",
        name_ar: "كلاسيكي",
        subs: &[
            SubCategorySeed { slug: "art-deco", name_en: "Art Deco", name_ar: "آرت ديكو" },
            SubCategorySeed { slug: "neoclassic", name_en: "Neoclassic", name_ar: "نيوكلاسيك" },
            SubCategorySeed { slug: "french-country", name_en: "French Country", name_ar: "ريفي فرنسي" },
        ],
    },
    CategorySeed {
        slug: "modern",
        name_en: "Modern",
        name_ar: "حديث",
        subs: &[
            SubCategorySeed { slug: "minimalist", name_en: "Minimalist", name_ar: "بسيط" },
            SubCategorySeed { slug: "japandi", name_en: "Japandi", name_ar: "جاباندي" },
            SubCategorySeed { slug: "industrial", name_en: "Industrial", name_ar: "صناعي" },
            SubCategorySeed { slug: "scandinavian", name_en: "Scandinavian", name_ar: "اسكندنافي" },
        ],
    },
    CategorySeed {
        slug: "eclectic",
        name_en: "Eclectic",
        name_ar: "انتقائي",
        subs: &[
            SubCategorySeed { slug: "bohemian", name_en: "Bohemian", name_ar: "بوهيمي" },
            SubCategorySeed { slug: "wabi-sabi", name_en: "Wabi-Sabi", name_ar: "وابي سابي" },
            SubCategorySeed { slug: "mediterranean", name_en: "Mediterranean", name_ar: "متوسطي" },
        ],
    },
];

pub const APPROACHES: &[ApproachSeed] = &[
    ApproachSeed { slug: "timeless", name_en: "Timeless", name_ar: "خالد" },
    ApproachSeed { slug: "minimal", name_en: "Minimal", name_ar: "بسيط" },
    ApproachSeed { slug: "maximal", name_en: "Maximal", name_ar: "غني" },
];

pub const COLORS: &[ColorSeed] = &[
    ColorSeed { slug: "ivory", name_en: "Ivory", name_ar: "عاجي", hex: "#FFFFF0", group: "neutral" },
    ColorSeed { slug: "sand", name_en: "Sand", name_ar: "رملي", hex: "#D8C7A9", group: "neutral" },
    ColorSeed { slug: "charcoal", name_en: "Charcoal", name_ar: "فحمي", hex: "#36454F", group: "neutral" },
    ColorSeed { slug: "terracotta", name_en: "Terracotta", name_ar: "طيني", hex: "#C8553D", group: "warm" },
    ColorSeed { slug: "sage", name_en: "Sage", name_ar: "ميرمية", hex: "#9CAF88", group: "cool" },
    ColorSeed { slug: "navy", name_en: "Navy", name_ar: "كحلي", hex: "#202A44", group: "cool" },
];

pub const ROOM_TYPES: &[RoomTypeSeed] = &[
    RoomTypeSeed { slug: "living-room", name_en: "Living Room", name_ar: "غرفة المعيشة" },
    RoomTypeSeed { slug: "dining-room", name_en: "Dining Room", name_ar: "غرفة الطعام" },
    RoomTypeSeed { slug: "bedroom", name_en: "Bedroom", name_ar: "غرفة النوم" },
    RoomTypeSeed { slug: "kitchen", name_en: "Kitchen", name_ar: "المطبخ" },
    RoomTypeSeed { slug: "bathroom", name_en: "Bathroom", name_ar: "الحمام" },
    RoomTypeSeed { slug: "home-office", name_en: "Home Office", name_ar: "مكتب منزلي" },
];

pub const MATERIAL_CATEGORIES: &[TaxonomySeed] = &[
    TaxonomySeed { slug: "stone", name_en: "Stone", name_ar: "حجر" },
    TaxonomySeed { slug: "wood", name_en: "Wood", name_ar: "خشب" },
    TaxonomySeed { slug: "metal", name_en: "Metal", name_ar: "معدن" },
    TaxonomySeed { slug: "textile", name_en: "Textile", name_ar: "نسيج" },
    TaxonomySeed { slug: "glass", name_en: "Glass", name_ar: "زجاج" },
    TaxonomySeed { slug: "ceramic", name_en: "Ceramic", name_ar: "سيراميك" },
    TaxonomySeed { slug: "leather", name_en: "Leather", name_ar: "جلد" },
    TaxonomySeed { slug: "mineral", name_en: "Mineral", name_ar: "معدني خام" },
    TaxonomySeed { slug: "composite", name_en: "Composite", name_ar: "مركب" },
];

pub const MATERIAL_TYPES: &[TaxonomySeed] = &[
    TaxonomySeed { slug: "natural", name_en: "Natural", name_ar: "طبيعي" },
    TaxonomySeed { slug: "engineered", name_en: "Engineered", name_ar: "مصنّع" },
    TaxonomySeed { slug: "finish", name_en: "Finish", name_ar: "تشطيب" },
];

#[cfg(test)]
mod tests {
    use super::*;
    use maison_core::matching::DEFAULT_MATERIAL_CATEGORY;

    fn assert_unique(slugs: Vec<&str>) {
        let mut sorted = slugs.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), slugs.len());
    }

    #[test]
    fn sub_category_slugs_are_globally_unique() {
        assert_unique(
            CATEGORIES
                .iter()
                .flat_map(|c| c.subs.iter().map(|s| s.slug))
                .collect(),
        );
    }

    #[test]
    fn catalog_slugs_are_unique_per_list() {
        assert_unique(CATEGORIES.iter().map(|c| c.slug).collect());
        assert_unique(APPROACHES.iter().map(|a| a.slug).collect());
        assert_unique(COLORS.iter().map(|c| c.slug).collect());
        assert_unique(ROOM_TYPES.iter().map(|r| r.slug).collect());
        assert_unique(MATERIAL_CATEGORIES.iter().map(|m| m.slug).collect());
    }

    #[test]
    fn taxonomy_covers_the_inference_fallback() {
        assert!(MATERIAL_CATEGORIES
            .iter()
            .any(|m| m.slug == DEFAULT_MATERIAL_CATEGORY));
    }

    #[test]
    fn taxonomy_covers_every_inferable_slug() {
        for name in [
            "Calacatta marble",
            "oak veneer",
            "brushed steel",
            "Belgian linen",
            "fluted glass",
            "zellige ceramic tile",
            "aniline leather",
            "polished concrete",
        ] {
            let slug = maison_core::matching::infer_material_category(name);
            assert!(
                MATERIAL_CATEGORIES.iter().any(|m| m.slug == slug),
                "no category for inferred slug {slug}"
            );
        }
    }

    #[test]
    fn every_color_has_a_group_and_hex() {
        for color in COLORS {
            assert!(color.hex.starts_with('#'));
            assert!(!color.group.is_empty());
        }
        assert!(COLORS.iter().any(|c| c.group == "neutral"));
    }
}
