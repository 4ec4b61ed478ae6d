//! Straight-line courier walk from store to customer.

use chrono::Utc;

use crate::geo::{distance_km, interpolate, Position};
use crate::tracking::LocationUpdate;

/// Delivery status label while the courier is moving.
pub const STATUS_OUT_FOR_DELIVERY: &str = "out_for_delivery";

/// Delivery status label on the final update.
pub const STATUS_DELIVERED: &str = "delivered";

/// Emits `steps + 1` evenly spaced updates, the last one at the customer.
#[derive(Debug, Clone)]
pub struct DeliveryWalk {
    order_id: String,
    store: Position,
    customer: Position,
    steps: u32,
    speed_kmh: f64,
    next_step: u32,
}

impl DeliveryWalk {
    pub fn new(
        order_id: impl Into<String>,
        store: Position,
        customer: Position,
        steps: u32,
        speed_kmh: f64,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            store,
            customer,
            steps: steps.max(1),
            speed_kmh,
            next_step: 0,
        }
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn is_finished(&self) -> bool {
        self.next_step > self.steps
    }
}

impl Iterator for DeliveryWalk {
    type Item = LocationUpdate;

    fn next(&mut self) -> Option<LocationUpdate> {
        if self.is_finished() {
            return None;
        }
        let step = self.next_step;
        self.next_step += 1;

        let arrived = step == self.steps;
        let position = if arrived {
            self.customer
        } else {
            interpolate(self.store, self.customer, f64::from(step) / f64::from(self.steps))
        };
        let remaining_km = distance_km(position, self.customer);
        let eta_minutes = if self.speed_kmh > 0.0 {
            (remaining_km / self.speed_kmh * 60.0).ceil()
        } else {
            0.0
        };

        Some(LocationUpdate {
            order_id: self.order_id.clone(),
            position,
            eta_minutes,
            distance_remaining: (remaining_km * 100.0).round() / 100.0,
            status: if arrived {
                STATUS_DELIVERED
            } else {
                STATUS_OUT_FOR_DELIVERY
            }
            .to_string(),
            server_timestamp: Utc::now(),
        })
    }
}
