//! Delivery commands.
//!
//! # Usage
//!
//! ```bash
//! wm deliveries list
//! wm deliveries create \
//!     --customer Alice \
//!     --warehouse "221B Baker Street, London" \
//!     --date 2024-01-01 \
//!     --address "10 Downing Street, London"
//! ```

use std::error::Error;

use waymark_client::{DeliveryForm, WorkflowPhase, map};
use waymark_core::Delivery;

use super::{Controller, login_hint};

#[allow(clippy::print_stdout)]
fn print_delivery(delivery: &Delivery) {
    println!(
        "#{} {} on {}",
        delivery.id, delivery.customer_name, delivery.delivery_date
    );
    for marker in map::markers(delivery) {
        println!("    {:<18} {}", marker.kind.label(), marker.osm_url());
    }
}

pub async fn list(ctl: &mut Controller) -> Result<(), Box<dyn Error>> {
    let loaded = ctl.load_deliveries().await.map(<[Delivery]>::to_vec);
    match loaded {
        Ok(deliveries) if deliveries.is_empty() => {
            #[allow(clippy::print_stdout)]
            {
                println!("No deliveries yet");
            }
            Ok(())
        }
        Ok(deliveries) => {
            deliveries.iter().for_each(print_delivery);
            Ok(())
        }
        Err(failure) => {
            login_hint(ctl);
            Err(failure.into())
        }
    }
}

pub async fn create(ctl: &mut Controller, mut form: DeliveryForm) -> Result<(), Box<dyn Error>> {
    match ctl.create_delivery(&mut form).await {
        WorkflowPhase::Created(delivery) => {
            print_delivery(&delivery);
            Ok(())
        }
        WorkflowPhase::Failed(failure) => {
            login_hint(ctl);
            Err(failure.into())
        }
        _ => Err("customer, warehouse, date and address must all be non-empty".into()),
    }
}
