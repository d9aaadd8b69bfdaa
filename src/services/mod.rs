// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod delivery;
pub mod mail;
pub mod payment;
pub mod presence;

pub use delivery::{ClientEvent, DeliveryEngine, SendMessageRequest, ServerEvent};
pub use mail::Mailer;
pub use payment::PaymentClient;
pub use presence::{ConnectionHandle, PresenceInfo, PresenceRegistry};
