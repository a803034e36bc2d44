use crate::workflows::turnover::domain::{
    HotTubLevel, JobSizeTier, LaundryKind, PropertyConfiguration,
};

// Linear duration model fitted against historical clean times.
const INTERCEPT: f64 = -0.585;
const PER_BEDROOM: f64 = 0.950;
const PER_BATHROOM: f64 = 0.620;
const PER_250_SQFT: f64 = 0.1905;

const BASIC_HOT_TUB_HOURS: f64 = 0.333;

/// Compute the hours one clean of this property is expected to take. The
/// result is frozen onto the job at ingestion; payouts price against the
/// frozen value even if the property's settings change later.
pub fn expected_hours(property: &PropertyConfiguration) -> f64 {
    let mut hours = INTERCEPT
        + PER_BEDROOM * f64::from(property.bedrooms)
        + PER_BATHROOM * property.bathrooms
        + PER_250_SQFT * (f64::from(property.square_feet) / 250.0);

    if let Some(laundry) = property.laundry {
        if laundry.kind == LaundryKind::OffSite {
            hours += off_site_laundry_hours(property.job_size_tier());
        }
    }

    if let Some(hot_tub) = property.hot_tub {
        if hot_tub.level == HotTubLevel::Basic {
            hours += BASIC_HOT_TUB_HOURS;
        }
    }

    round_two_decimals(hours)
}

fn off_site_laundry_hours(tier: JobSizeTier) -> f64 {
    match tier {
        JobSizeTier::Standard => 1.25,
        JobSizeTier::Large => 1.75,
        JobSizeTier::Estate => 2.25,
    }
}

fn round_two_decimals(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::turnover::domain::{
        HotTubCadence, HotTubService, LaundryService, PropertyId,
    };

    fn property(bedrooms: u32, bathrooms: f64, square_feet: u32) -> PropertyConfiguration {
        PropertyConfiguration {
            id: PropertyId("prop-hours".to_string()),
            address: "1 Test Ln".to_string(),
            bedrooms,
            bathrooms,
            square_feet,
            coordinates: None,
            laundry: None,
            hot_tub: None,
        }
    }

    #[test]
    fn base_formula_matches_fitted_model() {
        // -0.585 + 0.950*3 + 0.620*2 + 0.1905*(1500/250) = 4.648 -> 4.65
        let property = property(3, 2.0, 1500);
        assert_eq!(expected_hours(&property), 4.65);
    }

    #[test]
    fn off_site_laundry_adds_tiered_hours() {
        let mut property = property(3, 2.0, 1500);
        property.laundry = Some(LaundryService {
            kind: LaundryKind::OffSite,
            loads: 4,
        });
        // Large tier adds 1.75h on top of 4.648.
        assert_eq!(expected_hours(&property), 6.40);
    }

    #[test]
    fn in_unit_laundry_adds_nothing() {
        let mut property = property(3, 2.0, 1500);
        property.laundry = Some(LaundryService {
            kind: LaundryKind::InUnit,
            loads: 2,
        });
        assert_eq!(expected_hours(&property), 4.65);
    }

    #[test]
    fn basic_hot_tub_adds_fixed_duration() {
        let mut property = property(2, 1.0, 1000);
        property.hot_tub = Some(HotTubService {
            level: HotTubLevel::Basic,
            cadence: HotTubCadence::EveryTurnover,
        });
        // -0.585 + 1.900 + 0.620 + 0.762 + 0.333 = 3.030
        assert_eq!(expected_hours(&property), 3.03);
    }
}
