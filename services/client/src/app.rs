use std::sync::Arc;

use tracing::warn;

use crate::config::ClientConfig;
use crate::domain::repository::IdentityService;
use crate::domain::types::Session;
use crate::error::ClientError;
use crate::guard::GuardContext;
use crate::infra::identity::GoTrueIdentity;
use crate::infra::local::FileLocalStore;
use crate::infra::realtime::RealtimeBookingFeed;
use crate::infra::rest::{
    RestBookingRepository, RestClient, RestFeedbackRepository, RestVolunteerRepository,
};
use crate::infra::storage::BucketStorage;
use crate::state::{StateSync, Store};

pub type Local = Arc<FileLocalStore>;

/// Concrete wiring of the client: one identity provider, one REST client
/// sharing its session, one store.
pub struct App {
    pub config: ClientConfig,
    pub local: Local,
    pub identity: Arc<GoTrueIdentity<Local>>,
    pub rest: RestClient,
    pub store: Store,
}

impl App {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let local = Arc::new(FileLocalStore::open(&config.data_dir)?);
        let identity = Arc::new(GoTrueIdentity::new(&config, Arc::clone(&local))?);
        let rest = RestClient::new(&config, identity.session())?;
        Ok(Self {
            config,
            local,
            identity,
            rest,
            store: Store::new(),
        })
    }

    /// Restore the stored session and bring the store in line with it.
    pub async fn start(&self) -> Result<(), ClientError> {
        if let Err(e) = self.identity.restore().await {
            warn!(error = %e.detail(), "could not restore session; continuing signed out");
        }
        self.sync_session().await
    }

    /// Mirror the current identity session into the store and run the
    /// role/profile effects once.
    pub async fn sync_session(&self) -> Result<(), ClientError> {
        let session = self.session();
        let sync = self.sync();
        sync.apply_session(&session)?;
        sync.settle().await;
        Ok(())
    }

    pub fn session(&self) -> Session {
        self.identity.session().borrow().clone()
    }

    pub fn guard(&self) -> GuardContext {
        GuardContext::new(&self.session(), &self.store.snapshot())
    }

    pub fn sync(&self) -> StateSync<Local, RestVolunteerRepository> {
        StateSync {
            store: self.store.clone(),
            local: Arc::clone(&self.local),
            volunteers: self.volunteers(),
        }
    }

    pub fn volunteers(&self) -> RestVolunteerRepository {
        RestVolunteerRepository {
            client: self.rest.clone(),
        }
    }

    pub fn bookings(&self) -> RestBookingRepository {
        RestBookingRepository {
            client: self.rest.clone(),
        }
    }

    pub fn feedback(&self) -> RestFeedbackRepository {
        RestFeedbackRepository {
            client: self.rest.clone(),
        }
    }

    pub fn storage(&self) -> BucketStorage {
        BucketStorage {
            client: self.rest.clone(),
            bucket: self.config.photo_bucket.clone(),
        }
    }

    pub fn feed(&self) -> RealtimeBookingFeed {
        RealtimeBookingFeed::new(&self.config, self.identity.session())
    }
}
