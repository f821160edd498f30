pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, LoginOutcome, NewAccount, ResetRequest};
pub use auth_service_impl::SeaOrmAuthService;

pub mod account_service;
pub mod account_service_impl;
pub use account_service::{AccountError, AccountService, ProfileUpdate};
pub use account_service_impl::SeaOrmAccountService;

pub mod two_factor_service;
pub mod two_factor_service_impl;
pub use two_factor_service::{
    TwoFactorError, TwoFactorService, TwoFactorSetup, TwoFactorVerification,
};
pub use two_factor_service_impl::SeaOrmTwoFactorService;

pub mod mailer;
pub use mailer::Mailer;
