use std::rc::Rc;

use crate::core::{ProviderKind, Space};
use crate::wallet::WalletManager;

/// Ordered `(space, provider) -> adapter` table. Static once the plugin is built.
#[derive(Default, Clone)]
pub struct ManagerRegistry {
    entries: Vec<(Space, ProviderKind, Rc<dyn WalletManager>)>,
}

impl ManagerRegistry {
    pub fn new() -> Self { Self::default() }

    /// Keyed by the adapter's own space/provider; re-registering a pair replaces it in place.
    pub fn register(&mut self, manager: Rc<dyn WalletManager>) -> &mut Self {
        let (space, provider) = (manager.space(), manager.provider());
        match self.entries.iter_mut().find(|(s, p, _)| *s == space && *p == provider) {
            Some(entry) => entry.2 = manager,
            None => self.entries.push((space, provider, manager)),
        }
        self
    }

    pub fn get(&self, space: Space, provider: ProviderKind) -> Option<Rc<dyn WalletManager>> {
        self.entries.iter().find(|(s, p, _)| *s == space && *p == provider).map(|(_, _, m)| m.clone())
    }

    pub fn spaces(&self) -> Vec<Space> {
        let mut spaces = Vec::new();
        for (space, _, _) in &self.entries {
            if !spaces.contains(space) {
                spaces.push(*space);
            }
        }
        spaces
    }

    pub fn providers_for(&self, space: Space) -> Vec<ProviderKind> {
        self.entries.iter().filter(|(s, _, _)| *s == space).map(|(_, p, _)| *p).collect()
    }

    pub fn managers(&self) -> impl Iterator<Item = &Rc<dyn WalletManager>> {
        self.entries.iter().map(|(_, _, m)| m)
    }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventRecorder;
    use crate::wallet::{AdapterConfig, InjectedWalletManager};

    fn manager(config: AdapterConfig) -> Rc<dyn WalletManager> {
        Rc::new(InjectedWalletManager::new(config, None, Rc::new(EventRecorder::new())))
    }

    #[test]
    fn ordered_and_deduplicated() {
        let mut registry = ManagerRegistry::new();
        registry
            .register(manager(AdapterConfig::fluent_espace()))
            .register(manager(AdapterConfig::fluent_core()))
            .register(manager(AdapterConfig::metamask_espace()));

        assert_eq!(registry.spaces(), vec![Space::Evm, Space::Native]);
        assert_eq!(registry.providers_for(Space::Evm), vec![ProviderKind::Fluent, ProviderKind::MetaMask]);
        assert_eq!(registry.providers_for(Space::Native), vec![ProviderKind::Fluent]);
        assert!(registry.get(Space::Native, ProviderKind::MetaMask).is_none());
    }

    #[test]
    fn reregistering_replaces() {
        let mut registry = ManagerRegistry::new();
        registry.register(manager(AdapterConfig::fluent_core()));
        registry.register(manager(AdapterConfig::fluent_core()));
        assert_eq!(registry.managers().count(), 1);
    }
}
