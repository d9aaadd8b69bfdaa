// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod chatroom;
pub mod course;
pub mod entitlement;
pub mod progress;
pub mod user;

pub use chatroom::{Chatroom, Message, UnreadCount};
pub use course::{Course, Lecture};
pub use entitlement::{Entitlement, PurchaseOutcome};
pub use progress::Progress;
pub use user::{PublicUser, Role, User};
