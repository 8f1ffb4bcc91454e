use async_trait::async_trait;
use log::info;
use std::sync::Arc;

use crate::{
    reconcile, stations_to_geojson, AgrometSource, DmcCredentials, DmcSource, Error,
    FeatureCollection, Fetcher, FirmsSource,
};

pub const DEFAULT_DMC_BASE_URL: &str = "https://climatologia.meteochile.gob.cl";
pub const DEFAULT_AGROMET_BASE_URL: &str = "https://agrometeorologia.cl";
pub const DEFAULT_FIRMS_BASE_URL: &str = "https://firms.modaps.eosdis.nasa.gov";

/// Base URLs of the three upstream services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub dmc: String,
    pub agromet: String,
    pub firms: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            dmc: DEFAULT_DMC_BASE_URL.to_string(),
            agromet: DEFAULT_AGROMET_BASE_URL.to_string(),
            firms: DEFAULT_FIRMS_BASE_URL.to_string(),
        }
    }
}

/// Produces the two published feeds, one full upstream cycle per call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn stations(&self, credentials: &DmcCredentials) -> Result<FeatureCollection, Error>;
    async fn firms(&self, map_key: &str, area: &str) -> Result<FeatureCollection, Error>;
}

pub struct Feeds {
    dmc: DmcSource,
    agromet: AgrometSource,
    firms: FirmsSource,
}

impl Feeds {
    pub fn new(fetcher: Arc<dyn Fetcher>, endpoints: &Endpoints) -> Self {
        Feeds {
            dmc: DmcSource::new(fetcher.clone(), endpoints.dmc.clone()),
            agromet: AgrometSource::new(fetcher.clone(), endpoints.agromet.clone()),
            firms: FirmsSource::new(fetcher, endpoints.firms.clone()),
        }
    }
}

#[async_trait]
impl FeedSource for Feeds {
    async fn stations(&self, credentials: &DmcCredentials) -> Result<FeatureCollection, Error> {
        let (primary, secondary) =
            tokio::join!(self.dmc.fetch(credentials), self.agromet.fetch());
        let stations = reconcile(primary?, secondary?);
        info!("combined data: {} stations", stations.len());
        stations_to_geojson(&stations)
    }

    async fn firms(&self, map_key: &str, area: &str) -> Result<FeatureCollection, Error> {
        self.firms.fetch(map_key, area).await
    }
}
