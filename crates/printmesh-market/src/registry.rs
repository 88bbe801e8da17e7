//! Provider registry.

use std::collections::HashMap;

use printmesh_ledger::PrincipalId;
use serde::{Deserialize, Serialize};

use crate::error::{MarketError, Result};
use crate::order::OrderId;

/// A registered service provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    /// The provider's principal. Never changes.
    pub id: PrincipalId,
    /// Free-form description supplied at registration.
    pub details: String,
    /// The order most recently started by the scheduler, if still running.
    pub current_order: Option<OrderId>,
}

/// Registered providers in registration order.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: HashMap<PrincipalId, Provider>,
    order: Vec<PrincipalId>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `principal` as a provider.
    ///
    /// # Errors
    ///
    /// [`MarketError::AlreadyExists`] if the principal is already registered.
    pub fn register(&mut self, principal: PrincipalId, details: String) -> Result<()> {
        if self.providers.contains_key(&principal) {
            return Err(MarketError::AlreadyExists {
                kind: "provider",
                id: principal.to_string(),
            });
        }
        self.order.push(principal.clone());
        self.providers.insert(
            principal.clone(),
            Provider {
                id: principal,
                details,
                current_order: None,
            },
        );
        Ok(())
    }

    /// Whether `principal` is registered.
    #[must_use]
    pub fn is_registered(&self, principal: &PrincipalId) -> bool {
        self.providers.contains_key(principal)
    }

    /// Looks up a provider.
    #[must_use]
    pub fn get(&self, principal: &PrincipalId) -> Option<&Provider> {
        self.providers.get(principal)
    }

    /// Snapshot of all providers, oldest registration first.
    #[must_use]
    pub fn list(&self) -> Vec<Provider> {
        self.order
            .iter()
            .filter_map(|id| self.providers.get(id))
            .cloned()
            .collect()
    }

    /// Provider ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &PrincipalId> {
        self.order.iter()
    }

    /// Points the provider at its running order.
    pub fn set_current_order(&mut self, principal: &PrincipalId, order: Option<OrderId>) {
        if let Some(provider) = self.providers.get_mut(principal) {
            provider.current_order = order;
        }
    }

    /// Clears `current_order` if it points at `order`.
    pub fn clear_current_order(&mut self, principal: &PrincipalId, order: &OrderId) {
        if let Some(provider) = self.providers.get_mut(principal) {
            if provider.current_order.as_ref() == Some(order) {
                provider.current_order = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_list_in_order() {
        let mut registry = ProviderRegistry::new();
        for name in ["zeta", "alpha", "mu"] {
            registry
                .register(PrincipalId::new(name), format!("{name} prints"))
                .expect("register");
        }

        let names: Vec<_> = registry.list().into_iter().map(|p| p.id.to_string()).collect();
        assert_eq!(names, ["zeta", "alpha", "mu"]);
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = ProviderRegistry::new();
        let id = PrincipalId::new("printer-1");
        registry.register(id.clone(), "first".into()).expect("register");

        let err = registry.register(id.clone(), "second".into()).unwrap_err();
        assert!(matches!(err, MarketError::AlreadyExists { kind: "provider", .. }));
        assert_eq!(registry.list().len(), 1);
        assert_eq!(registry.get(&id).map(|p| p.details.as_str()), Some("first"));
    }

    #[test]
    fn current_order_tracking() {
        let mut registry = ProviderRegistry::new();
        let id = PrincipalId::new("printer-1");
        registry.register(id.clone(), String::new()).expect("register");

        let running = OrderId::new("o1");
        registry.set_current_order(&id, Some(running.clone()));
        registry.clear_current_order(&id, &OrderId::new("other"));
        assert_eq!(registry.get(&id).and_then(|p| p.current_order.clone()), Some(running.clone()));

        registry.clear_current_order(&id, &running);
        assert!(registry.get(&id).is_some_and(|p| p.current_order.is_none()));
    }

    #[test]
    fn unknown_provider_is_not_registered() {
        let registry = ProviderRegistry::new();
        assert!(!registry.is_registered(&PrincipalId::new("ghost")));
        assert!(registry.get(&PrincipalId::new("ghost")).is_none());
    }
}
