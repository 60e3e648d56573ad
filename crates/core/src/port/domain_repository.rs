// Domain Registry Port (Interface)

use crate::domain::{Domain, DomainId};
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for per-tenant domain configuration
#[async_trait]
pub trait DomainRepository: Send + Sync {
    /// Find domain by ID
    async fn find_by_id(&self, id: &DomainId) -> Result<Option<Domain>>;

    /// Insert or replace a domain
    async fn upsert(&self, domain: &Domain) -> Result<()>;

    /// All registered domains, ordered by name
    async fn list(&self) -> Result<Vec<Domain>>;
}

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct InMemoryDomainRepository {
        domains: Mutex<HashMap<DomainId, Domain>>,
        fail_lookup: AtomicBool,
    }

    impl InMemoryDomainRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_domains(domains: Vec<Domain>) -> Self {
            let repo = Self::new();
            {
                let mut map = repo.domains.lock().unwrap();
                for domain in domains {
                    map.insert(domain.id.clone(), domain);
                }
            }
            repo
        }

        /// Make `find_by_id` fail like an unreachable registry
        pub fn set_fail_lookup(&self, fail: bool) {
            self.fail_lookup.store(fail, Ordering::SeqCst);
        }

        pub fn remove(&self, id: &str) {
            self.domains.lock().unwrap().remove(id);
        }
    }

    #[async_trait]
    impl DomainRepository for InMemoryDomainRepository {
        async fn find_by_id(&self, id: &DomainId) -> Result<Option<Domain>> {
            if self.fail_lookup.load(Ordering::SeqCst) {
                return Err(AppError::Database("Domain registry unreachable".to_string()));
            }
            Ok(self.domains.lock().unwrap().get(id).cloned())
        }

        async fn upsert(&self, domain: &Domain) -> Result<()> {
            self.domains
                .lock()
                .unwrap()
                .insert(domain.id.clone(), domain.clone());
            Ok(())
        }

        async fn list(&self) -> Result<Vec<Domain>> {
            let mut domains: Vec<Domain> = self.domains.lock().unwrap().values().cloned().collect();
            domains.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(domains)
        }
    }
}
