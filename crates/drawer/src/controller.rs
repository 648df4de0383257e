//! The cart drawer controller.
//!
//! Every cart mutation ends the same way: re-fetch the whole cart from the
//! server and render that snapshot. The client never derives quantities or
//! totals on its own.
//!
//! # Ordering
//!
//! Network calls are suspension points, and the page stays clickable while
//! they are in flight. [`SyncPolicy`] decides what happens when operations
//! overlap:
//!
//! - [`SyncPolicy::Serialized`] (default): mutations run one at a time through
//!   a per-controller lane, and each fetch is stamped with an epoch; a
//!   snapshot is rendered only if no newer fetch has been issued since.
//! - [`SyncPolicy::Unguarded`]: no lane and no fencing. Two quick `+1` clicks
//!   can both read the same quantity and one update is lost, and a slow
//!   response can overwrite a newer render.
//!
//! # Errors
//!
//! The UI-facing operations (`add_item`, `change_quantity`, `remove_item`,
//! `refresh`, `dispatch`) never fail: errors are logged and the drawer is
//! left as it was. The `try_` variants return the error instead.

use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use cart_drawer_core::{AddPayload, AddedItem, CartSnapshot, LineChange, LineItemKey};
use tracing::{debug, error, instrument, warn};

use crate::client::CartApi;
use crate::config::{DEFAULT_CONTINUE_SHOPPING_URL, DrawerConfig};
use crate::dispatch::{DrawerEvent, ESCAPE_KEY, ItemCommand};
use crate::dom::{ACTIVE_CLASS, DrawerElements, Element, ElementSource, Page, SCROLL_LOCKED};
use crate::error::Result;
use crate::view::{CartView, render_items};

/// How overlapping cart operations are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SyncPolicy {
    /// One mutation at a time; stale snapshots are discarded.
    #[default]
    Serialized,
    /// No ordering at all.
    Unguarded,
}

impl SyncPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Serialized => "serialized",
            Self::Unguarded => "unguarded",
        }
    }
}

impl fmt::Display for SyncPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a [`SyncPolicy`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown sync policy '{0}' (expected 'serialized' or 'unguarded')")]
pub struct ParseSyncPolicyError(String);

impl FromStr for SyncPolicy {
    type Err = ParseSyncPolicyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "serialized" => Ok(Self::Serialized),
            "unguarded" => Ok(Self::Unguarded),
            other => Err(ParseSyncPolicyError(other.to_string())),
        }
    }
}

/// What a quantity change ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// No line with that key; nothing was sent.
    Missing,
    /// The line now has this quantity.
    Updated { quantity: u32 },
    /// The quantity reached zero and the line was removed.
    Removed,
}

/// Whether a fetched snapshot reached the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Rendered,
    /// A newer fetch was issued while this one was in flight.
    Stale,
}

#[derive(Debug, Default)]
struct DrawerState {
    is_open: bool,
    issued_epoch: u64,
}

/// Keeps a cart drawer in step with the remote cart.
pub struct CartController<A, E, P> {
    api: A,
    elements: DrawerElements<E>,
    page: P,
    policy: SyncPolicy,
    continue_shopping_url: String,
    state: Mutex<DrawerState>,
    lane: tokio::sync::Mutex<()>,
}

impl<A, E, P> CartController<A, E, P>
where
    A: CartApi,
    E: Element,
    P: Page,
{
    /// Create a controller over already-bound elements.
    pub fn new(api: A, elements: DrawerElements<E>, page: P) -> Self {
        Self {
            api,
            elements,
            page,
            policy: SyncPolicy::default(),
            continue_shopping_url: DEFAULT_CONTINUE_SHOPPING_URL.to_string(),
            state: Mutex::new(DrawerState::default()),
            lane: tokio::sync::Mutex::new(()),
        }
    }

    /// Create a controller, looking its elements up in `source`.
    pub fn from_config<S>(api: A, source: &S, page: P, config: &DrawerConfig) -> Self
    where
        S: ElementSource<Element = E>,
    {
        Self::new(api, DrawerElements::query(source), page)
            .with_policy(config.sync_policy)
            .with_continue_shopping_url(&config.continue_shopping_url)
    }

    #[must_use]
    pub fn with_policy(mut self, policy: SyncPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_continue_shopping_url(mut self, url: &str) -> Self {
        url.clone_into(&mut self.continue_shopping_url);
        self
    }

    #[must_use]
    pub const fn policy(&self) -> SyncPolicy {
        self.policy
    }

    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state().is_open
    }

    fn state(&self) -> MutexGuard<'_, DrawerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Visibility
    // =========================================================================

    /// Show the drawer and lock background scroll.
    pub fn open(&self) {
        let mut state = self.state();
        if state.is_open {
            return;
        }
        state.is_open = true;

        if let Some(sidebar) = &self.elements.sidebar {
            sidebar.add_class(ACTIVE_CLASS);
        }
        if let Some(overlay) = &self.elements.overlay {
            overlay.add_class(ACTIVE_CLASS);
        }
        self.page.set_body_overflow(SCROLL_LOCKED);
    }

    /// Hide the drawer and restore background scroll.
    pub fn close(&self) {
        let mut state = self.state();
        if !state.is_open {
            return;
        }
        state.is_open = false;

        if let Some(sidebar) = &self.elements.sidebar {
            sidebar.remove_class(ACTIVE_CLASS);
        }
        if let Some(overlay) = &self.elements.overlay {
            overlay.remove_class(ACTIVE_CLASS);
        }
        self.page.set_body_overflow("");
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Render a snapshot into the count badge, total label and item list.
    ///
    /// # Errors
    ///
    /// Returns an error if the item list template fails to render; nothing is
    /// written in that case.
    pub fn render(&self, snapshot: &CartSnapshot) -> Result<()> {
        let view = CartView::from(snapshot);
        let items_html = render_items(&view, &self.continue_shopping_url)?;
        self.write_view(&view, &items_html);
        Ok(())
    }

    fn write_view(&self, view: &CartView, items_html: &str) {
        if let Some(count) = &self.elements.count {
            count.set_text(&view.count_label());
        }
        if let Some(total) = &self.elements.total {
            total.set_text(&view.total);
        }
        if let Some(items) = &self.elements.items {
            items.set_inner_html(items_html);
        }
    }

    /// Fetch the cart and render it.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch or the render fails.
    #[instrument(skip(self), fields(policy = %self.policy))]
    pub async fn try_refresh(&self) -> Result<RefreshOutcome> {
        let epoch = {
            let mut state = self.state();
            state.issued_epoch += 1;
            state.issued_epoch
        };

        let snapshot = self.api.fetch().await?;

        let view = CartView::from(&snapshot);
        let items_html = render_items(&view, &self.continue_shopping_url)?;

        let state = self.state();
        if self.policy == SyncPolicy::Serialized && state.issued_epoch != epoch {
            debug!(
                epoch,
                latest = state.issued_epoch,
                "Discarding stale cart snapshot"
            );
            return Ok(RefreshOutcome::Stale);
        }
        self.write_view(&view, &items_html);
        drop(state);

        Ok(RefreshOutcome::Rendered)
    }

    /// Fetch the cart and render it, logging any failure.
    pub async fn refresh(&self) {
        if let Err(e) = self.try_refresh().await {
            error!(error = %e, kind = e.kind(), "Failed to refresh cart");
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Wait for the mutation lane under [`SyncPolicy::Serialized`].
    async fn lane(&self) -> Option<tokio::sync::MutexGuard<'_, ()>> {
        match self.policy {
            SyncPolicy::Serialized => Some(self.lane.lock().await),
            SyncPolicy::Unguarded => None,
        }
    }

    /// Add to the cart, then refresh and open the drawer.
    ///
    /// # Errors
    ///
    /// Returns an error if the add is rejected or its reply names no item, or
    /// if the follow-up refresh fails. The drawer is not opened on error.
    #[instrument(skip(self, payload))]
    pub async fn try_add_item(&self, payload: &AddPayload) -> Result<AddedItem> {
        let _lane = self.lane().await;

        let item = self.api.add(payload).await?;
        self.try_refresh().await?;
        self.open();

        Ok(item)
    }

    /// Add to the cart, logging any failure.
    pub async fn add_item(&self, payload: &AddPayload) {
        if let Err(e) = self.try_add_item(payload).await {
            error!(error = %e, kind = e.kind(), "Failed to add item to cart");
        }
    }

    /// Change a line's quantity by `delta`, relative to the server's current value.
    ///
    /// Removes the line if the result would be zero or less; never sends a
    /// negative quantity. A key not in the cart is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if any fetch or mutation fails.
    #[instrument(skip(self, key), fields(key = %key))]
    pub async fn try_change_quantity(&self, key: &LineItemKey, delta: i64) -> Result<QuantityChange> {
        let _lane = self.lane().await;

        let snapshot = self.api.fetch().await?;
        let Some(item) = snapshot.item(key) else {
            debug!("Line not in cart, ignoring quantity change");
            return Ok(QuantityChange::Missing);
        };

        let new_quantity = i64::from(item.quantity()).saturating_add(delta);
        if new_quantity <= 0 {
            self.remove_line(key).await?;
            return Ok(QuantityChange::Removed);
        }

        let quantity = u32::try_from(new_quantity).unwrap_or(u32::MAX);
        self.api
            .change(&LineChange {
                id: key.clone(),
                quantity,
            })
            .await?;
        self.try_refresh().await?;

        Ok(QuantityChange::Updated { quantity })
    }

    /// Change a line's quantity by `delta`, logging any failure.
    pub async fn change_quantity(&self, key: &LineItemKey, delta: i64) {
        if let Err(e) = self.try_change_quantity(key, delta).await {
            error!(error = %e, kind = e.kind(), key = %key, "Failed to update quantity");
        }
    }

    /// Remove a line, then refresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the mutation or the refresh fails.
    #[instrument(skip(self, key), fields(key = %key))]
    pub async fn try_remove_item(&self, key: &LineItemKey) -> Result<()> {
        let _lane = self.lane().await;
        self.remove_line(key).await
    }

    /// Remove a line, logging any failure.
    pub async fn remove_item(&self, key: &LineItemKey) {
        if let Err(e) = self.try_remove_item(key).await {
            error!(error = %e, kind = e.kind(), key = %key, "Failed to remove item");
        }
    }

    /// Remove without taking the lane; callers already hold it.
    async fn remove_line(&self, key: &LineItemKey) -> Result<()> {
        self.api
            .change(&LineChange {
                id: key.clone(),
                quantity: 0,
            })
            .await?;
        self.try_refresh().await?;
        Ok(())
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// React to a page event.
    ///
    /// Ignored entirely when the page has no drawer toggle. Close and overlay
    /// clicks need their element bound; row clicks need the item list.
    pub async fn dispatch(&self, event: DrawerEvent) {
        if !self.elements.is_bound() {
            debug!(?event, "No cart drawer on page, ignoring event");
            return;
        }

        match event {
            DrawerEvent::ToggleClicked => self.open(),
            DrawerEvent::CloseClicked => {
                if self.elements.close.is_some() {
                    self.close();
                }
            }
            DrawerEvent::OverlayClicked => {
                if self.elements.overlay.is_some() {
                    self.close();
                }
            }
            DrawerEvent::KeyDown(key) => {
                if key == ESCAPE_KEY {
                    self.close();
                }
            }
            DrawerEvent::ItemsClicked { classes, key } => {
                if self.elements.items.is_none() {
                    return;
                }
                let Some(command) = ItemCommand::from_click(&classes, key.as_deref()) else {
                    return;
                };
                match command.intent.delta() {
                    Some(delta) => self.change_quantity(&command.key, delta).await,
                    None => self.remove_item(&command.key).await,
                }
            }
            DrawerEvent::AddToCart(trigger) => match trigger.payload() {
                Some(payload) => self.add_item(&payload).await,
                None => warn!(?trigger, "Add to cart control has no form or valid product id"),
            },
            DrawerEvent::MobileAddToCart(form) => match form {
                Some(form) => self.add_item(&AddPayload::Form(form)).await,
                None => debug!("No product form on page for mobile add to cart"),
            },
        }
    }
}
