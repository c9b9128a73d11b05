//! Medication order lifecycle: hold, resume, discontinue.
//!
//! Order management is reserved for licensed and pharmacy roles.
//! Delegated administer roles (TMA) and support roles report concerns
//! and request reorders instead; they never touch the order itself.

use chrono::NaiveDateTime;
use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::db::repository::{get_order, insert_audit_entry, update_order_status};
use crate::db::DatabaseError;
use crate::models::enums::{OrderStatus, Role};
use crate::permissions;

#[derive(Error, Debug)]
pub enum OrderError {
    #[error("role {0:?} may not manage medication orders")]
    NotAuthorized(Role),

    #[error("order cannot move from {from:?} to {to:?}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Place an active order on hold with a reason.
pub fn hold_order(
    conn: &Connection,
    order_id: &Uuid,
    user_id: &Uuid,
    role: Role,
    reason: &str,
    now: NaiveDateTime,
) -> Result<(), OrderError> {
    transition(conn, order_id, user_id, role, OrderStatus::Held, Some(reason), now)
}

/// Lift a hold, returning the order to active.
pub fn resume_order(
    conn: &Connection,
    order_id: &Uuid,
    user_id: &Uuid,
    role: Role,
    now: NaiveDateTime,
) -> Result<(), OrderError> {
    transition(conn, order_id, user_id, role, OrderStatus::Active, None, now)
}

/// Permanently discontinue an order. There is no way back; a new order
/// must be prescribed instead.
pub fn discontinue_order(
    conn: &Connection,
    order_id: &Uuid,
    user_id: &Uuid,
    role: Role,
    now: NaiveDateTime,
) -> Result<(), OrderError> {
    transition(conn, order_id, user_id, role, OrderStatus::Discontinued, None, now)
}

fn transition(
    conn: &Connection,
    order_id: &Uuid,
    user_id: &Uuid,
    role: Role,
    to: OrderStatus,
    hold_reason: Option<&str>,
    now: NaiveDateTime,
) -> Result<(), OrderError> {
    if !permissions::can_manage_orders(role) {
        return Err(OrderError::NotAuthorized(role));
    }

    let order = get_order(conn, order_id)?;
    let valid = match (order.status, to) {
        (OrderStatus::Active, OrderStatus::Held) => true,
        (OrderStatus::Held, OrderStatus::Active) => true,
        (OrderStatus::Active | OrderStatus::Held, OrderStatus::Discontinued) => true,
        _ => false,
    };
    if !valid {
        return Err(OrderError::InvalidTransition {
            from: order.status,
            to,
        });
    }

    update_order_status(conn, order_id, to, hold_reason)?;

    let action = match to {
        OrderStatus::Held => "hold",
        OrderStatus::Active => "resume",
        _ => "discontinue",
    };
    insert_audit_entry(
        conn,
        &now,
        "orders",
        action,
        "MedicationOrder",
        Some(user_id),
        Some(&order.patient_id),
    )?;
    tracing::info!(order = %order_id, from = order.status.as_str(), to = to.as_str(), "order transition");

    Ok(())
}
