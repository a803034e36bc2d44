use std::sync::Arc;

use serde::Serialize;

use super::domain::{Cleaner, GeoPoint, OnCallStatus, PropertyId};
use super::gateways::{GeocodeError, GeocodeResolver};
use super::repository::{RepositoryError, TurnoverStore};

const EARTH_RADIUS_MILES: f64 = 3959.0;
pub const DEFAULT_RADIUS_MILES: f64 = 25.0;

/// Great-circle distance between two coordinates, in miles.
pub fn haversine_miles(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_MILES * h.sqrt().asin()
}

/// One candidate with its computed distance to the property.
#[derive(Debug, Clone, Serialize)]
pub struct RankedCleaner {
    pub cleaner: Cleaner,
    pub distance_miles: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct RankingOptions {
    pub radius_miles: f64,
    pub exclude_on_job: bool,
}

impl Default for RankingOptions {
    fn default() -> Self {
        Self {
            radius_miles: DEFAULT_RADIUS_MILES,
            exclude_on_job: false,
        }
    }
}

/// Rank candidates for a property: drop cleaners without coordinates or
/// beyond the radius (and optionally those already on a job), then order
/// by reliability descending with distance as the tie-break.
pub fn rank_candidates(
    origin: GeoPoint,
    cleaners: &[Cleaner],
    options: RankingOptions,
) -> Vec<RankedCleaner> {
    let mut ranked: Vec<RankedCleaner> = cleaners
        .iter()
        .filter(|cleaner| !(options.exclude_on_job && cleaner.on_call_status == OnCallStatus::OnJob))
        .filter_map(|cleaner| {
            let coordinates = cleaner.coordinates?;
            let distance_miles = haversine_miles(origin, coordinates);
            (distance_miles <= options.radius_miles).then(|| RankedCleaner {
                cleaner: cleaner.clone(),
                distance_miles,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.cleaner
            .reliability_score
            .total_cmp(&a.cleaner.reliability_score)
            .then(a.distance_miles.total_cmp(&b.distance_miles))
    });

    ranked
}

#[derive(Debug, thiserror::Error)]
pub enum AssignmentError {
    #[error("property {} not found", .0 .0)]
    PropertyNotFound(PropertyId),
    #[error("address could not be geocoded: {0}")]
    AddressNotFound(String),
    #[error(transparent)]
    Geocode(#[from] GeocodeError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Candidate lookup used by admin assignment and automatic reassignment.
pub struct AssignmentRanker<S, G> {
    store: Arc<S>,
    geocoder: Arc<G>,
    options: RankingOptions,
}

impl<S, G> AssignmentRanker<S, G>
where
    S: TurnoverStore,
    G: GeocodeResolver,
{
    pub fn new(store: Arc<S>, geocoder: Arc<G>) -> Self {
        Self::with_options(store, geocoder, RankingOptions::default())
    }

    pub fn with_options(store: Arc<S>, geocoder: Arc<G>, options: RankingOptions) -> Self {
        Self {
            store,
            geocoder,
            options,
        }
    }

    /// Ranked candidates within radius of the property, per the configured
    /// options.
    pub fn ranked_candidates(
        &self,
        property_id: &PropertyId,
    ) -> Result<Vec<RankedCleaner>, AssignmentError> {
        let origin = self.property_coordinates(property_id)?;
        let cleaners = self.store.cleaners()?;
        Ok(rank_candidates(origin, &cleaners, self.options))
    }

    /// Best candidate for automatic reassignment: first of the ranked list
    /// with on-job cleaners excluded.
    pub fn best_replacement(
        &self,
        property_id: &PropertyId,
    ) -> Result<Option<RankedCleaner>, AssignmentError> {
        let origin = self.property_coordinates(property_id)?;
        let cleaners = self.store.cleaners()?;
        let options = RankingOptions {
            exclude_on_job: true,
            ..self.options
        };
        Ok(rank_candidates(origin, &cleaners, options).into_iter().next())
    }

    /// Resolve the property's coordinates, caching a fresh geocode result
    /// back onto the property record.
    fn property_coordinates(&self, property_id: &PropertyId) -> Result<GeoPoint, AssignmentError> {
        let mut property = self
            .store
            .fetch_property(property_id)?
            .ok_or_else(|| AssignmentError::PropertyNotFound(property_id.clone()))?;

        if let Some(coordinates) = property.coordinates {
            return Ok(coordinates);
        }

        let resolved = self
            .geocoder
            .resolve(&property.address)?
            .ok_or_else(|| AssignmentError::AddressNotFound(property.address.clone()))?;

        property.coordinates = Some(resolved);
        self.store.update_property(property)?;
        Ok(resolved)
    }
}
