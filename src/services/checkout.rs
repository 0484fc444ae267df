use tracing::{info, warn};

use crate::backends::traits::{OrderRequest, StorefrontApi};
use crate::models::OrderConfirmation;
use crate::services::cart::CartStore;
use crate::utils::Result;

/// What the order endpoint should be asked to confirm for the current cart.
pub async fn pending_order(cart: &CartStore) -> Result<OrderRequest> {
    if cart.is_auto_selection_cart().await? {
        Ok(OrderRequest::AutoSelection)
    } else {
        Ok(OrderRequest::Items(cart.order_items_param().await?))
    }
}

/// Confirm the cart with the storefront. The selection is only discarded
/// once the server accepted the order; on an error reply it is kept as is.
pub async fn submit_order(api: &dyn StorefrontApi, cart: &CartStore) -> Result<OrderConfirmation> {
    let order = pending_order(cart).await?;
    info!("Submitting order: {:?}", order);

    let confirmation = match api.submit_order(&order).await {
        Ok(confirmation) => confirmation,
        Err(e) => {
            warn!("Order rejected: {}", e);
            return Err(e);
        }
    };

    cart.discard_ordered_selection().await?;
    info!("Order confirmed");
    Ok(confirmation)
}
