use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{
    CapacityAssignment, CartItem, NewOrder, Order, OrderDetail, OrderFilter, OrderItem,
    OrderStatus, PaymentMethod, PromoCode, QuoteRequest, Ticket,
};
use crate::services::checkout::{self, Catalog, Quote};
use crate::services::promo::normalize_code;
use crate::storage::{attendees, capacities, promo_codes, tickets};
use crate::utils::error::{AppError, AppResult};
use crate::utils::validation;

struct LoadedCatalog {
    tickets: Vec<Ticket>,
    capacities: Vec<CapacityAssignment>,
    promo: Option<PromoCode>,
}

impl LoadedCatalog {
    fn as_catalog(&self) -> Catalog<'_> {
        Catalog {
            tickets: &self.tickets,
            capacities: &self.capacities,
            promo: self.promo.as_ref(),
        }
    }
}

/// Loads everything a cart is priced against.
///
/// Besides the cart's own tickets this includes every ticket sharing a
/// capacity assignment with them, since their `sold` counts feed the cap.
async fn load_catalog(
    conn: &mut PgConnection,
    event_id: Uuid,
    items: &[CartItem],
    promo_code: Option<&str>,
    lock: bool,
) -> AppResult<LoadedCatalog> {
    let cart_ids: Vec<Uuid> = items.iter().map(|item| item.ticket_id).collect();
    let capacities = capacities::list_touching(&mut *conn, event_id, &cart_ids).await?;

    let mut ticket_ids = cart_ids;
    ticket_ids.extend(capacities.iter().flat_map(|c| c.ticket_ids.iter().copied()));
    ticket_ids.sort();
    ticket_ids.dedup();
    let tickets = tickets::fetch_many(&mut *conn, event_id, &ticket_ids, lock).await?;

    let promo = match validation::optional(promo_code) {
        Some(code) => {
            let code = normalize_code(&code)?;
            Some(promo_codes::find_by_code(&mut *conn, event_id, &code, lock).await?)
        }
        None => None,
    };

    Ok(LoadedCatalog {
        tickets,
        capacities,
        promo,
    })
}

/// Prices a cart without writing anything.
pub async fn quote(pool: &PgPool, event_id: Uuid, request: &QuoteRequest) -> AppResult<Quote> {
    let mut conn = pool.acquire().await?;
    let catalog = load_catalog(
        &mut conn,
        event_id,
        &request.items,
        request.promo_code.as_deref(),
        false,
    )
    .await?;

    checkout::quote(&request.items, &catalog.as_catalog(), Utc::now())
}

/// Places a back-office order.
///
/// Tickets and the promo code are locked, the cart is re-priced against the
/// locked rows, and the order, its items and one attendee per seat are
/// written together with the inventory and promo counters.
pub async fn create(pool: &PgPool, event_id: Uuid, order: &NewOrder) -> AppResult<OrderDetail> {
    let mut tx = pool.begin().await?;

    let catalog = load_catalog(
        &mut tx,
        event_id,
        &order.items,
        order.promo_code.as_deref(),
        true,
    )
    .await?;
    let quote = checkout::quote(&order.items, &catalog.as_catalog(), Utc::now())?;

    let payment_method = if quote.is_free() {
        PaymentMethod::Free
    } else {
        order.payment_method
    };

    let placed = sqlx::query_as::<_, Order>(
        "INSERT INTO orders
             (id, event_id, buyer_name, buyer_email, status, payment_method, promo_code_id,
              subtotal, discount, total, notes)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(event_id)
    .bind(&order.buyer_name)
    .bind(&order.buyer_email)
    .bind(order.status.as_ref())
    .bind(payment_method.as_ref())
    .bind(quote.promo_code_id)
    .bind(quote.subtotal)
    .bind(quote.discount)
    .bind(quote.total)
    .bind(&order.notes)
    .fetch_one(&mut *tx)
    .await?;

    let mut items = Vec::with_capacity(quote.lines.len());
    for line in &quote.lines {
        let item = sqlx::query_as::<_, OrderItem>(
            "INSERT INTO order_items (id, order_id, ticket_id, quantity, unit_price, discount)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(placed.id)
        .bind(line.ticket_id)
        .bind(line.quantity)
        .bind(line.unit_price)
        .bind(line.discount)
        .fetch_one(&mut *tx)
        .await?;
        items.push(item);

        tickets::adjust_sold(&mut tx, line.ticket_id, line.quantity).await?;
    }

    if let Some(promo_id) = quote.promo_code_id {
        promo_codes::adjust_uses(&mut tx, promo_id, 1).await?;
    }

    let mut seat_holders = Vec::with_capacity(order.attendees.len());
    for details in &order.attendees {
        seat_holders.push(attendees::insert(&mut tx, event_id, placed.id, details).await?);
    }

    tx.commit().await?;

    tracing::info!(
        order_id = %placed.id,
        %event_id,
        seats = seat_holders.len(),
        total = %placed.total,
        "Order placed"
    );

    Ok(OrderDetail {
        order: placed,
        items,
        attendees: seat_holders,
    })
}

pub async fn list(pool: &PgPool, event_id: Uuid, filter: &OrderFilter) -> AppResult<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders
         WHERE event_id = $1 AND ($2::TEXT IS NULL OR status = $2)
         ORDER BY created_at DESC",
    )
    .bind(event_id)
    .bind(filter.status.map(|s| s.to_string()))
    .fetch_all(pool)
    .await?;

    Ok(orders)
}

pub async fn find(pool: &PgPool, event_id: Uuid, order_id: Uuid) -> AppResult<Order> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 AND event_id = $2")
        .bind(order_id)
        .bind(event_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Order", order_id))
}

async fn items(conn: &mut PgConnection, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT * FROM order_items WHERE order_id = $1 ORDER BY ticket_id",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;

    Ok(items)
}

pub async fn find_detail(pool: &PgPool, event_id: Uuid, order_id: Uuid) -> AppResult<OrderDetail> {
    let order = find(pool, event_id, order_id).await?;
    let items = items(&mut *pool.acquire().await?, order_id).await?;
    let attendees = attendees::list_by_order(pool, order_id).await?;

    Ok(OrderDetail {
        order,
        items,
        attendees,
    })
}

/// Cancels an order and gives its seats and promo use back.
pub async fn cancel(pool: &PgPool, event_id: Uuid, order_id: Uuid) -> AppResult<Order> {
    let mut tx = pool.begin().await?;

    let order = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE id = $1 AND event_id = $2 FOR UPDATE",
    )
    .bind(order_id)
    .bind(event_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Order", order_id))?;

    if order.status == OrderStatus::Cancelled {
        return Err(AppError::Conflict("Order is already cancelled".to_string()));
    }

    let items = items(&mut tx, order_id).await?;
    let ticket_ids: Vec<Uuid> = items.iter().map(|item| item.ticket_id).collect();
    // Same lock order as checkout.
    tickets::fetch_many(&mut tx, event_id, &ticket_ids, true).await?;

    // Seats whose attendee was deleted were already released.
    let active_seats = sqlx::query_as::<_, (Uuid, i64)>(
        "SELECT ticket_id, COUNT(*) FROM attendees
         WHERE order_id = $1 AND status = 'active'
         GROUP BY ticket_id",
    )
    .bind(order_id)
    .fetch_all(&mut *tx)
    .await?;
    for (ticket_id, seats) in active_seats {
        let seats = i32::try_from(seats)
            .map_err(|_| AppError::InternalServerError("Seat count overflow".to_string()))?;
        tickets::adjust_sold(&mut tx, ticket_id, -seats).await?;
    }

    if let Some(promo_id) = order.promo_code_id {
        promo_codes::adjust_uses(&mut tx, promo_id, -1).await?;
    }
    attendees::cancel_for_order(&mut tx, order_id).await?;

    let cancelled = sqlx::query_as::<_, Order>(
        "UPDATE orders SET status = 'cancelled', updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(order_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    tracing::info!(%order_id, %event_id, "Order cancelled");
    Ok(cancelled)
}

/// Settles a pending order.
pub async fn mark_paid(pool: &PgPool, event_id: Uuid, order_id: Uuid) -> AppResult<Order> {
    let updated = sqlx::query_as::<_, Order>(
        "UPDATE orders SET status = 'paid', updated_at = now()
         WHERE id = $1 AND event_id = $2 AND status = 'pending'
         RETURNING *",
    )
    .bind(order_id)
    .bind(event_id)
    .fetch_optional(pool)
    .await?;

    match updated {
        Some(order) => Ok(order),
        None => {
            let order = find(pool, event_id, order_id).await?;
            Err(AppError::Conflict(format!(
                "Only pending orders can be marked paid; this one is {}",
                order.status
            )))
        }
    }
}
