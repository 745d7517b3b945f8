//! Admin API handlers.
//!
//! | Method | Path | Module |
//! |--------|------|--------|
//! | `GET` | `/api/status` | [`station`] |
//! | `PUT` | `/api/communities/{community}/destination` | [`station`] |
//! | `POST` | `/api/communities/{community}/fire` | [`station`] |
//! | `GET` | `/api/schedule` | [`schedule`] |
//! | `PUT` / `DELETE` | `/api/communities/{community}/schedule/{date}` | [`schedule`] |
//! | `DELETE` | `/api/communities/{community}/schedule` | [`schedule`] |
//! | `GET` | `/api/communities/{community}/roles` | [`roles`] |
//! | `PUT` / `DELETE` | `/api/communities/{community}/roles/{role}` | [`roles`] |
//!
//! Every route requires operator credentials. Per-community authorization
//! is enforced by the commands themselves.

pub mod roles;
pub mod schedule;
pub mod station;
