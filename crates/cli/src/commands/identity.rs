//! Identity commands.

use cardshop_storefront::models::Identity;

/// Generate a device identity and print its principal and recovery key.
///
/// Useful for setting `BOOTSTRAP_ADMIN_PRINCIPAL` before the first login.
pub fn new_identity() {
    let identity = Identity::generate();

    #[allow(clippy::print_stdout)]
    {
        println!("Principal:    {}", identity.principal);
        println!("Recovery key: {}", identity.recovery_key());
    }
}
