//! Offline OUI vendor lookup, used only to decorate output.

use std::sync::OnceLock;

use mac_oui::Oui;

use crate::network::mac::CanonicalAddress;

/// Maps an address prefix to the registered manufacturer name.
pub trait VendorRepository: Send + Sync {
    fn get_vendor(&self, mac: &CanonicalAddress) -> Option<String>;
}

static OUI_DB: OnceLock<Option<Oui>> = OnceLock::new();

fn get_oui_db() -> Option<&'static Oui> {
    OUI_DB
        .get_or_init(|| match Oui::default() {
            Ok(db) => Some(db),
            Err(e) => {
                tracing::warn!("Vendor database unavailable: {e}");
                None
            }
        })
        .as_ref()
}

/// [`VendorRepository`] backed by the embedded `mac_oui` database.
pub struct MacOuiRepo;

impl VendorRepository for MacOuiRepo {
    fn get_vendor(&self, mac: &CanonicalAddress) -> Option<String> {
        let db = get_oui_db()?;
        match db.lookup_by_mac(&mac.to_string()) {
            Ok(Some(entry)) => Some(entry.company_name.clone()),
            _ => None,
        }
    }
}
