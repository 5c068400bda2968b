//! Category → agency routing table for the case router.

/// Agency owning infrastructure, sanitation, and uncategorized reports.
pub const AGENCY_INFRA: &str = "AGENCY_INFRA";
pub const AGENCY_HEALTH: &str = "AGENCY_HEALTH";
pub const AGENCY_SAFETY: &str = "AGENCY_SAFETY";

/// Fixed routing table. Anything outside the known set falls back to
/// AGENCY_INFRA; routing never fails.
pub fn agency_for_category(category: &str) -> &'static str {
    match category {
        "infrastruktur" | "kebersihan" | "lainnya" => AGENCY_INFRA,
        "kesehatan" => AGENCY_HEALTH,
        "keamanan" | "kriminalitas" => AGENCY_SAFETY,
        _ => AGENCY_INFRA,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_mapping_is_honored() {
        assert_eq!(agency_for_category("infrastruktur"), AGENCY_INFRA);
        assert_eq!(agency_for_category("kebersihan"), AGENCY_INFRA);
        assert_eq!(agency_for_category("lainnya"), AGENCY_INFRA);
        assert_eq!(agency_for_category("kesehatan"), AGENCY_HEALTH);
        assert_eq!(agency_for_category("keamanan"), AGENCY_SAFETY);
        assert_eq!(agency_for_category("kriminalitas"), AGENCY_SAFETY);
    }

    #[test]
    fn unknown_category_falls_back_to_infra() {
        assert_eq!(agency_for_category("zzz"), AGENCY_INFRA);
        assert_eq!(agency_for_category(""), AGENCY_INFRA);
    }
}
