//! Wiring shared by the gateway and the reminder worker

use crate::notifier::Notifier;
use crate::reminders::{ReminderPolicy, ReminderScheduler};
use crate::service::{ContractService, TemplateService};
use crate::store::{
    ActivityLog, CadenceClaims, ContractStore, MemoryStore, NotificationSink, TemplateStore,
};
use pactforge_common::auth::{ConfigDirectory, UserDirectory};
use pactforge_common::mail::create_mailer;
use pactforge_common::{AppConfig, DbPool, Mailer, Repository, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// `database.url` value that selects the in-process store
pub const IN_MEMORY_DATABASE: &str = "memory";

/// Every storage seam the services need
#[derive(Clone)]
pub struct Stores {
    pub templates: Arc<dyn TemplateStore>,
    pub contracts: Arc<dyn ContractStore>,
    pub activity: Arc<dyn ActivityLog>,
    pub notifications: Arc<dyn NotificationSink>,
    pub claims: Arc<dyn CadenceClaims>,
}

impl Stores {
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            templates: store.clone(),
            contracts: store.clone(),
            activity: store.clone(),
            notifications: store.clone(),
            claims: store,
        }
    }

    pub fn sql(repo: Repository) -> Self {
        let repo = Arc::new(repo);
        Self {
            templates: repo.clone(),
            contracts: repo.clone(),
            activity: repo.clone(),
            notifications: repo.clone(),
            claims: repo,
        }
    }
}

#[derive(Clone)]
pub struct Workflow {
    pub templates: Arc<TemplateService>,
    pub contracts: Arc<ContractService>,
    pub reminders: Arc<ReminderScheduler>,
    /// `None` when running on the in-process store
    pub db: Option<DbPool>,
}

impl Workflow {
    /// Connect storage and mail as configured
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let mailer = create_mailer(&config.mail)?;
        info!(provider = mailer.provider_name(), "Mailer initialized");

        let (stores, db) = if config.database.url == IN_MEMORY_DATABASE {
            warn!("Using the in-memory store; data is lost on restart");
            (Stores::memory(), None)
        } else {
            info!("Connecting to database...");
            let db = DbPool::new(&config.database).await?;
            (Stores::sql(Repository::new(db.clone())), Some(db))
        };

        let directory = Arc::new(ConfigDirectory::new(&config.approvals));
        Ok(Self::assemble(config, stores, mailer, directory, db))
    }

    pub fn assemble(
        config: &AppConfig,
        stores: Stores,
        mailer: Arc<dyn Mailer>,
        directory: Arc<dyn UserDirectory>,
        db: Option<DbPool>,
    ) -> Self {
        let notifier = Arc::new(Notifier::new(
            mailer,
            stores.notifications.clone(),
            directory,
            config.approvals.app_base_url.clone(),
            config.mail.timeout(),
        ));

        Self {
            templates: Arc::new(TemplateService::new(
                stores.templates.clone(),
                stores.activity.clone(),
                notifier.clone(),
            )),
            contracts: Arc::new(ContractService::new(
                stores.contracts.clone(),
                stores.activity.clone(),
                notifier.clone(),
            )),
            reminders: Arc::new(ReminderScheduler::new(
                stores.templates,
                stores.contracts,
                stores.activity,
                stores.claims,
                notifier,
                ReminderPolicy::from(&config.reminders),
            )),
            db,
        }
    }

    /// Database round trip; always healthy on the in-process store
    pub async fn ping(&self) -> Result<()> {
        match &self.db {
            Some(db) => db.ping().await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TemplateContent;

    #[tokio::test]
    async fn test_memory_wiring() {
        let config = AppConfig {
            database: pactforge_common::config::DatabaseConfig {
                url: IN_MEMORY_DATABASE.to_string(),
                ..AppConfig::default().database
            },
            ..AppConfig::default()
        };
        let workflow = Workflow::connect(&config).await.unwrap();
        assert!(workflow.db.is_none());
        workflow.ping().await.unwrap();

        let t = workflow
            .templates
            .create(
                TemplateContent {
                    name: "NDA".into(),
                    ..Default::default()
                },
                "alice@example.com",
            )
            .await
            .unwrap();
        assert_eq!(workflow.templates.get(t.id).await.unwrap().version, 1);
    }
}
