use serde::Serialize;

use crate::config::Routes;
use crate::error::Result;
use crate::ports::ModalHost;
use crate::session::{self, Role, SessionContext, SessionStore, ROLE_KEY};

pub const ADD_DOCTOR_MODAL: &str = "addDoctor";
pub const BRAND: &str = "MedPortal";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum NavTarget {
    Route(String),
    OpenModal(&'static str),
    /// Admin and doctor logout: clear everything, go home.
    Logout,
    /// Patient logout: drop the token, keep the public patient role.
    LogoutPatient,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub id: &'static str,
    pub label: &'static str,
    pub target: NavTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderView {
    pub brand: &'static str,
    pub home: String,
    pub items: Vec<NavItem>,
}

fn item(id: &'static str, label: &'static str, target: NavTarget) -> NavItem {
    NavItem { id, label, target }
}

/// Navigation for the session's role. Call only after [`session::gate`]
/// has let the page proceed.
pub fn render_header(context: &SessionContext, routes: &Routes) -> HeaderView {
    let items = match context {
        SessionContext::Admin { .. } => vec![
            item("addDocBtn", "Add Doctor", NavTarget::OpenModal(ADD_DOCTOR_MODAL)),
            item("logoutLink", "Logout", NavTarget::Logout),
        ],
        SessionContext::Doctor { .. } => vec![
            item("homeBtn", "Home", NavTarget::Route(routes.doctor_home.clone())),
            item("logoutLink", "Logout", NavTarget::Logout),
        ],
        SessionContext::LoggedPatient { .. } => vec![
            item("homeBtn", "Home", NavTarget::Route(routes.logged_patient_home.clone())),
            item(
                "appointmentsBtn",
                "Appointments",
                NavTarget::Route(routes.appointments.clone()),
            ),
            item("logoutPatientLink", "Logout", NavTarget::LogoutPatient),
        ],
        SessionContext::Patient | SessionContext::Unauthenticated => vec![
            item("loginBtn", "Login", NavTarget::Route(routes.login.clone())),
            item("signupBtn", "Sign Up", NavTarget::Route(routes.signup.clone())),
        ],
    };
    HeaderView {
        brand: BRAND,
        home: routes.home.clone(),
        items,
    }
}

/// Act on a header item. Returns the route to navigate to, if any.
pub fn follow(
    target: &NavTarget,
    store: &dyn SessionStore,
    modals: &dyn ModalHost,
    routes: &Routes,
) -> Result<Option<String>> {
    match target {
        NavTarget::Route(route) => {
            if *route == routes.login || *route == routes.signup {
                store.set(ROLE_KEY, Role::Patient.as_tag())?;
            }
            Ok(Some(route.clone()))
        }
        NavTarget::OpenModal(name) => {
            modals.open_modal(name);
            Ok(None)
        }
        NavTarget::Logout => {
            session::logout(store)?;
            Ok(Some(routes.home.clone()))
        }
        NavTarget::LogoutPatient => {
            session::logout_patient(store)?;
            Ok(Some(routes.patient_home.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemorySessionStore, TOKEN_KEY};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Modals(Mutex<Vec<String>>);

    impl ModalHost for Modals {
        fn open_modal(&self, name: &str) {
            self.0.lock().unwrap().push(name.to_string());
        }

        fn close_modal(&self, _: &str) {}
    }

    fn labels(view: &HeaderView) -> Vec<&str> {
        view.items.iter().map(|i| i.label).collect()
    }

    #[test]
    fn nav_per_role() {
        let routes = Routes::default();
        let admin = render_header(&SessionContext::Admin { token: "t".into() }, &routes);
        assert_eq!(labels(&admin), vec!["Add Doctor", "Logout"]);

        let doctor = render_header(&SessionContext::Doctor { token: "t".into() }, &routes);
        assert_eq!(labels(&doctor), vec!["Home", "Logout"]);
        assert_eq!(doctor.items[0].target, NavTarget::Route(routes.doctor_home.clone()));

        let patient = render_header(
            &SessionContext::LoggedPatient {
                token: "t".into(),
                profile: None,
            },
            &routes,
        );
        assert_eq!(labels(&patient), vec!["Home", "Appointments", "Logout"]);
        assert_eq!(patient.items[2].target, NavTarget::LogoutPatient);

        for ctx in [SessionContext::Patient, SessionContext::Unauthenticated] {
            assert_eq!(labels(&render_header(&ctx, &routes)), vec!["Login", "Sign Up"]);
        }
    }

    #[test]
    fn add_doctor_opens_modal() {
        let store = MemorySessionStore::new();
        let modals = Modals::default();
        let route = follow(
            &NavTarget::OpenModal(ADD_DOCTOR_MODAL),
            &store,
            &modals,
            &Routes::default(),
        )
        .unwrap();
        assert_eq!(route, None);
        assert_eq!(*modals.0.lock().unwrap(), vec!["addDoctor"]);
    }

    #[test]
    fn logout_variants() {
        let routes = Routes::default();
        let modals = Modals::default();

        let store = MemorySessionStore::with_entries([(ROLE_KEY, "admin"), (TOKEN_KEY, "t")]);
        let route = follow(&NavTarget::Logout, &store, &modals, &routes).unwrap();
        assert_eq!(route.as_deref(), Some("/"));
        assert_eq!(store.get(ROLE_KEY), None);
        assert_eq!(store.get(TOKEN_KEY), None);

        let store = MemorySessionStore::with_entries([(ROLE_KEY, "loggedPatient"), (TOKEN_KEY, "t")]);
        follow(&NavTarget::LogoutPatient, &store, &modals, &routes).unwrap();
        assert_eq!(store.get(ROLE_KEY).as_deref(), Some("patient"));
        assert_eq!(store.get(TOKEN_KEY), None);
    }

    #[test]
    fn login_link_marks_visitor_as_patient() {
        let routes = Routes::default();
        let store = MemorySessionStore::new();
        let route = follow(
            &NavTarget::Route(routes.login.clone()),
            &store,
            &Modals::default(),
            &routes,
        )
        .unwrap();
        assert_eq!(route, Some(routes.login.clone()));
        assert_eq!(store.get(ROLE_KEY).as_deref(), Some("patient"));
    }
}
