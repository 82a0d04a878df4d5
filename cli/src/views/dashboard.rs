use std::fmt::Write;

use farm_core::types::CurrentUser;
use farm_core::{FarmApi, HttpResponse};

use super::Slot;

/// Header panel: who is signed in. A failed lookup signs the user out.
#[derive(Debug, Default)]
pub struct DashboardView {
    pub user: Slot<CurrentUser>,
}

impl DashboardView {
    pub fn load(&mut self, api: &FarmApi) {
        self.user.begin();
        let outcome = api.current_user().and_then(|resp: HttpResponse| resp.json());
        // A 401 has already ended the session inside the client.
        let sign_out = matches!(&outcome, Err(e) if !e.is_unauthorized());
        self.user.finish(outcome, |_| "Could not load your account.".to_string());
        if sign_out {
            api.logout();
        }
    }

    pub fn render(&self) -> String {
        if self.user.loading {
            return "Loading dashboard...".to_string();
        }
        let Some(me) = &self.user.data else {
            return self.user.error.clone().unwrap_or_default();
        };

        let mut out = String::new();
        let _ = writeln!(out, "FarmerGPT - Smart Farming Assistant");
        let _ = writeln!(out, "Signed in as {} (@{})", me.user.display_name(), me.user.username);
        if let Some(location) = &me.profile.location {
            let _ = writeln!(out, "Location: {location}");
        }
        if let Some(size) = &me.profile.land_size {
            let _ = writeln!(out, "Land: {size} acres");
        }
        if let Some(years) = me.profile.experience_years {
            let _ = writeln!(out, "Experience: {years} years");
        }
        out
    }
}
