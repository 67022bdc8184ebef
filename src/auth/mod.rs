// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer-token authentication for the PromptHub API.
//!
//! ## Auth Flow
//!
//! 1. Client sends `Authorization: Bearer <token>` (HS256, issued by
//!    register/login)
//! 2. The auth gate middleware classifies the call:
//!    - token present → always verified, even on public methods; a bad
//!      credential is never downgraded to anonymous access
//!    - no token → allowed only if the access policy lists the method as
//!      public
//! 3. The resolved [`Principal`] is inserted into request extensions and
//!    handed to handlers by the [`Ctx`] extractor
//!
//! ## Security
//!
//! - Only the configured symmetric algorithm is accepted; any other
//!   algorithm in the token header is rejected outright
//!   (algorithm-confusion defense)
//! - The access policy fails closed: methods are principal-required unless
//!   explicitly allow-listed
//! - Clock skew tolerance is 60 seconds

pub mod error;
pub mod gate;
pub mod password;
pub mod policy;
pub mod principal;
pub mod token;

pub use error::AuthError;
pub use gate::Ctx;
pub use policy::AccessPolicy;
pub use principal::Principal;
pub use token::TokenAuthenticator;
