//! UserHub Core: shared domain abstractions.
//!
//! This crate defines the types and capability traits that the gateway, the
//! worker and the persistence layer all agree on. It contains no
//! infrastructure code.

pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod hasher;
pub mod pagination;
pub mod repository;
pub mod user;
