// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Data Wallet - signed, content-addressed wallet data store
//!
//! Tenants (resolved from an API key) register wallets identified by the
//! hash of an RSA public key. Wallets store versioned, client-encrypted data
//! items and share them with other wallets of the same tenant. Every wallet
//! request is authorized by a signature over path, body and timestamp.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Request signature verification and extractors
//! - `identity` - Wallet id and version hash derivation
//! - `storage` - Index and blob backends, and the wallet store on top
//! - `tenants` - API key to tenant resolution

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod identity;
pub mod models;
pub mod state;
pub mod storage;
pub mod tenants;

#[cfg(test)]
mod test_support;
