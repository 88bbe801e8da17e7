//! The transactional marketplace facade.
//!
//! [`PrintMarket`] runs every public operation as one critical section over
//! the registry, order book, custodian and journal. Within that section the
//! clock is read once, every guard runs, the custodian is called if value
//! has to move, and only then is state mutated. A failed guard or a failed
//! transfer therefore leaves nothing behind.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use printmesh_ledger::{Amount, PaymentLedger, PrincipalId};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::MarketConfig;
use crate::custodian::ValueCustodian;
use crate::error::{MarketError, Result};
use crate::events::{EventKind, MarketEvent};
use crate::lifecycle;
use crate::order::{Order, OrderId, OrderRequest};
use crate::orderbook::OrderBook;
use crate::registry::{Provider, ProviderRegistry};
use crate::scheduler::{self, SelectionPolicy};

#[derive(Debug)]
struct MarketState {
    registry: ProviderRegistry,
    book: OrderBook,
    custodian: ValueCustodian,
    journal: Vec<MarketEvent>,
}

impl MarketState {
    fn record(&mut self, at: DateTime<Utc>, kind: EventKind) {
        self.journal.push(MarketEvent { at, kind });
    }

    fn sweep(&mut self, provider: &PrincipalId, now: DateTime<Utc>) {
        let swept = self.book.sweep_expired(provider, now);
        if !swept.is_empty() {
            self.record(
                now,
                EventKind::OrdersSwept {
                    provider: provider.clone(),
                    order_ids: swept,
                },
            );
        }
    }

    fn order(&self, id: &OrderId) -> Result<&Order> {
        self.book.get(id).ok_or_else(|| MarketError::order_not_found(id))
    }

    fn order_mut(&mut self, id: &OrderId) -> Result<&mut Order> {
        self.book
            .get_mut(id)
            .ok_or_else(|| MarketError::order_not_found(id))
    }

    fn ensure_registered(&self, provider: &PrincipalId) -> Result<()> {
        if self.registry.is_registered(provider) {
            Ok(())
        } else {
            Err(MarketError::provider_not_found(provider))
        }
    }
}

/// Escrow and scheduling engine for a provider/customer marketplace.
pub struct PrintMarket {
    state: Mutex<MarketState>,
    clock: Arc<dyn Clock>,
    config: MarketConfig,
}

impl PrintMarket {
    /// Creates a marketplace that escrows into `custody_account`.
    ///
    /// # Errors
    ///
    /// [`MarketError::Config`] if `config` fails validation.
    pub fn new(
        ledger: Arc<dyn PaymentLedger>,
        custody_account: PrincipalId,
        clock: Arc<dyn Clock>,
        config: MarketConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(ledger, custody_account, clock, config))
    }

    /// Creates a marketplace on wall-clock time with default windows.
    #[must_use]
    pub fn with_defaults(ledger: Arc<dyn PaymentLedger>, custody_account: PrincipalId) -> Self {
        Self::from_parts(
            ledger,
            custody_account,
            Arc::new(SystemClock),
            MarketConfig::default(),
        )
    }

    fn from_parts(
        ledger: Arc<dyn PaymentLedger>,
        custody_account: PrincipalId,
        clock: Arc<dyn Clock>,
        config: MarketConfig,
    ) -> Self {
        Self {
            state: Mutex::new(MarketState {
                registry: ProviderRegistry::new(),
                book: OrderBook::new(),
                custodian: ValueCustodian::new(ledger, custody_account),
                journal: Vec::new(),
            }),
            clock,
            config,
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    /// The account customers must approve before ordering.
    #[must_use]
    pub fn custody_account(&self) -> PrincipalId {
        self.state.lock().custodian.account().clone()
    }

    fn selection_policy(&self) -> SelectionPolicy {
        SelectionPolicy {
            include_started: self.config.reselect_started_orders,
        }
    }

    // ---------------------------------------------------------------------
    // Providers
    // ---------------------------------------------------------------------

    /// Registers `principal` as a provider.
    ///
    /// # Errors
    ///
    /// [`MarketError::AlreadyExists`] if already registered.
    pub fn register_provider(
        &self,
        principal: PrincipalId,
        details: impl Into<String>,
    ) -> Result<()> {
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.registry.register(principal.clone(), details.into())?;
        info!(provider = %principal, "provider registered");
        state.record(now, EventKind::ProviderRegistered { provider: principal });
        Ok(())
    }

    /// All providers, in registration order.
    #[must_use]
    pub fn list_providers(&self) -> Vec<Provider> {
        self.state.lock().registry.list()
    }

    /// Looks up one provider.
    #[must_use]
    pub fn get_provider(&self, principal: &PrincipalId) -> Option<Provider> {
        self.state.lock().registry.get(principal).cloned()
    }

    // ---------------------------------------------------------------------
    // Order creation
    // ---------------------------------------------------------------------

    /// Opens an order, escrowing `request.price` from the customer.
    ///
    /// Lapsed and completed entries are swept from the provider's index
    /// before the new order is appended.
    ///
    /// # Errors
    ///
    /// [`MarketError::AlreadyExists`] for a live duplicate id,
    /// [`MarketError::NotFound`] for an unregistered provider,
    /// [`MarketError::InvalidArgument`] for a zero price or duration or a
    /// priority bid below the price, and any custodian error from the lock.
    pub fn create_order(&self, request: OrderRequest) -> Result<()> {
        let now = self.clock.now();
        let mut state = self.state.lock();

        if state.book.contains(&request.id) {
            return Err(MarketError::AlreadyExists {
                kind: "order",
                id: request.id.to_string(),
            });
        }
        state.ensure_registered(&request.provider)?;
        if request.price.is_zero() {
            return Err(MarketError::invalid_argument("price must be positive"));
        }
        if request.duration_secs == 0 {
            return Err(MarketError::invalid_argument("duration must be positive"));
        }
        let current_price = request.priority_bid.unwrap_or(request.price);
        if current_price < request.price {
            return Err(MarketError::invalid_argument(format!(
                "priority bid {current_price} is below price {}",
                request.price
            )));
        }
        let expiration_time = now
            .checked_add_signed(self.config.signing_window())
            .ok_or_else(|| MarketError::invalid_argument("signing deadline out of range"))?;

        state.custodian.lock(&request.customer, request.price)?;

        state.sweep(&request.provider, now);
        let order = Order {
            id: request.id,
            provider: request.provider,
            customer: request.customer,
            initial_price: request.price,
            current_price,
            duration_secs: request.duration_secs,
            start_time: None,
            expiration_time,
            signed: false,
            completed_by_provider: false,
            disputed_by_customer: false,
        };

        info!(
            order_id = %order.id,
            provider = %order.provider,
            customer = %order.customer,
            amount = %order.initial_price,
            "order created"
        );
        state.record(
            now,
            EventKind::OrderCreated {
                order_id: order.id.clone(),
                provider: order.provider.clone(),
                customer: order.customer.clone(),
                amount: order.initial_price,
            },
        );
        state.book.insert(order);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Provider actions
    // ---------------------------------------------------------------------

    /// Provider signs an order inside its signing window.
    ///
    /// # Errors
    ///
    /// [`MarketError::NotFound`], [`MarketError::Unauthorized`],
    /// [`MarketError::Expired`] once the window has closed, or
    /// [`MarketError::WrongState`] if already signed.
    pub fn sign_order(&self, order_id: &OrderId, caller: &PrincipalId) -> Result<()> {
        let now = self.clock.now();
        let mut state = self.state.lock();

        let mut signed = state.order(order_id)?.clone();
        lifecycle::sign(&mut signed, caller, now)?;

        state.sweep(&signed.provider, now);
        *state.order_mut(order_id)? = signed;

        info!(order_id = %order_id, provider = %caller, "order signed");
        state.record(
            now,
            EventKind::OrderSigned {
                order_id: order_id.clone(),
            },
        );
        Ok(())
    }

    /// The order `execute` would start for `provider`, if any.
    #[must_use]
    pub fn next_order(&self, provider: &PrincipalId) -> Option<OrderId> {
        let state = self.state.lock();
        scheduler::select_next(state.book.active_orders(provider), self.selection_policy()).cloned()
    }

    /// Starts the highest-priority active order for `provider`.
    ///
    /// # Errors
    ///
    /// [`MarketError::NotFound`] for an unregistered provider, or
    /// [`MarketError::NoActiveOrders`] when nothing is eligible.
    pub fn execute(&self, provider: &PrincipalId) -> Result<OrderId> {
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.ensure_registered(provider)?;

        let order_id =
            scheduler::select_next(state.book.active_orders(provider), self.selection_policy())
                .cloned()
                .ok_or_else(|| MarketError::NoActiveOrders {
                    provider: provider.clone(),
                })?;

        state.sweep(provider, now);
        let order = state.order_mut(&order_id)?;
        let restarted = order.start_time.is_some();
        lifecycle::start(order, now)?;
        let priority = scheduler::priority_factor(order);

        if restarted {
            warn!(
                order_id = %order_id,
                provider = %provider,
                priority,
                "restarting an order that was already running"
            );
        } else {
            info!(order_id = %order_id, provider = %provider, priority, "order started");
        }
        state
            .registry
            .set_current_order(provider, Some(order_id.clone()));
        state.record(
            now,
            EventKind::OrderStarted {
                order_id: order_id.clone(),
                priority,
                restarted,
            },
        );
        Ok(order_id)
    }

    /// Provider reports the job done before its execution deadline.
    ///
    /// # Errors
    ///
    /// [`MarketError::NotFound`], [`MarketError::Unauthorized`],
    /// [`MarketError::WrongState`] if not signed, not started or already
    /// completed, or [`MarketError::Expired`] past the deadline.
    pub fn complete_order(&self, order_id: &OrderId, caller: &PrincipalId) -> Result<()> {
        let now = self.clock.now();
        let mut state = self.state.lock();

        lifecycle::complete(state.order_mut(order_id)?, caller, now)?;

        state.registry.clear_current_order(caller, order_id);
        info!(order_id = %order_id, provider = %caller, "order completed");
        state.record(
            now,
            EventKind::OrderCompleted {
                order_id: order_id.clone(),
            },
        );
        Ok(())
    }

    /// Provider claims the escrow once the grace window has passed
    /// without a dispute. The order is deleted.
    ///
    /// # Errors
    ///
    /// Guard errors as for [`lifecycle::check_payable`], or
    /// [`MarketError::TransferFailed`] if the release fails.
    pub fn payout(&self, order_id: &OrderId, caller: &PrincipalId) -> Result<Amount> {
        let now = self.clock.now();
        let mut state = self.state.lock();

        let order = state.order(order_id)?;
        lifecycle::check_payable(order, caller, now, self.config.grace_period())?;
        let (provider, amount) = (order.provider.clone(), order.initial_price);

        state.custodian.release(&provider, amount)?;
        state.book.remove(order_id);
        state.registry.clear_current_order(&provider, order_id);

        info!(order_id = %order_id, provider = %provider, amount = %amount, "order paid out");
        state.record(
            now,
            EventKind::OrderPaidOut {
                order_id: order_id.clone(),
                amount,
            },
        );
        Ok(amount)
    }

    // ---------------------------------------------------------------------
    // Customer actions
    // ---------------------------------------------------------------------

    /// Customer disputes a completed order inside the grace window.
    ///
    /// # Errors
    ///
    /// [`MarketError::NotFound`], [`MarketError::Unauthorized`],
    /// [`MarketError::WrongState`] if not completed or already disputed, or
    /// [`MarketError::Expired`] once the grace window has closed.
    pub fn report_uncomplete(&self, order_id: &OrderId, caller: &PrincipalId) -> Result<()> {
        let now = self.clock.now();
        let mut state = self.state.lock();

        lifecycle::report_uncomplete(
            state.order_mut(order_id)?,
            caller,
            now,
            self.config.grace_period(),
        )?;

        info!(order_id = %order_id, customer = %caller, "order disputed");
        state.record(
            now,
            EventKind::OrderDisputed {
                order_id: order_id.clone(),
            },
        );
        Ok(())
    }

    /// Customer takes back the escrow of an order that was never signed
    /// before its signing window closed. The order is deleted.
    ///
    /// # Errors
    ///
    /// Guard errors as for [`lifecycle::check_refundable`], or
    /// [`MarketError::TransferFailed`] if the release fails.
    pub fn refund(&self, order_id: &OrderId, caller: &PrincipalId) -> Result<Amount> {
        let now = self.clock.now();
        let mut state = self.state.lock();

        let order = state.order(order_id)?;
        lifecycle::check_refundable(order, caller, now)?;
        let (provider, amount) = (order.provider.clone(), order.initial_price);

        state.custodian.release(caller, amount)?;
        state.book.remove(order_id);
        state.registry.clear_current_order(&provider, order_id);

        info!(order_id = %order_id, customer = %caller, amount = %amount, "order refunded");
        state.record(
            now,
            EventKind::OrderRefunded {
                order_id: order_id.clone(),
                amount,
            },
        );
        Ok(amount)
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Signed, not yet completed orders of the calling provider, in index
    /// order.
    ///
    /// # Errors
    ///
    /// [`MarketError::NotFound`] if the caller is not a registered provider.
    pub fn get_active_orders(&self, caller: &PrincipalId) -> Result<Vec<Order>> {
        let state = self.state.lock();
        state.ensure_registered(caller)?;
        Ok(state
            .book
            .active_orders(caller)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Orders placed by `customer` that their provider still indexes.
    ///
    /// Orders swept from the provider's index (lapsed unsigned, or
    /// completed) drop out of this view even though they remain
    /// refundable or payable by id.
    #[must_use]
    pub fn get_orders_for_customer(&self, customer: &PrincipalId) -> Vec<Order> {
        let state = self.state.lock();
        let orders = state.book.orders_for_customer(customer, state.registry.ids());
        debug!(customer = %customer, count = orders.len(), "customer orders listed");
        orders.into_iter().cloned().collect()
    }

    /// Looks up a live order by id.
    #[must_use]
    pub fn get_order(&self, order_id: &OrderId) -> Option<Order> {
        self.state.lock().book.get(order_id).cloned()
    }

    /// Sum of `initial_price` over every live order.
    #[must_use]
    pub fn escrowed_total(&self) -> Amount {
        self.state.lock().book.escrowed_total()
    }

    /// Value the custodian reports holding.
    #[must_use]
    pub fn custody_held(&self) -> Amount {
        self.state.lock().custodian.total_held()
    }

    /// Snapshot of the event journal, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<MarketEvent> {
        self.state.lock().journal.clone()
    }
}

impl std::fmt::Debug for PrintMarket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrintMarket")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
