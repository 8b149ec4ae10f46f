use super::session::Session;

/// Application routes. Unknown paths fall back to the default landing
/// route rather than a not-found surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Dashboard,
    Expenses,
    Income,
    Budgets,
    Accounts,
    Goals,
    Recurring,
    Reports,
    ImportExport,
    Debts,
    Households,
    Tax,
    Calendar,
    Achievements,
    Splits,
    Profile,
}

/// Where unknown paths and fresh logins land.
pub const DEFAULT_LANDING: Route = Route::Dashboard;

impl Route {
    pub fn from_path(path: &str) -> Self {
        match path.trim_end_matches('/') {
            "/login" => Route::Login,
            "/register" => Route::Register,
            "/dashboard" => Route::Dashboard,
            "/expenses" => Route::Expenses,
            "/income" => Route::Income,
            "/budgets" => Route::Budgets,
            "/accounts" => Route::Accounts,
            "/goals" => Route::Goals,
            "/recurring" => Route::Recurring,
            "/reports" => Route::Reports,
            "/import-export" => Route::ImportExport,
            "/debts" => Route::Debts,
            "/households" => Route::Households,
            "/tax" => Route::Tax,
            "/calendar" => Route::Calendar,
            "/achievements" => Route::Achievements,
            "/splits" => Route::Splits,
            "/profile" => Route::Profile,
            _ => DEFAULT_LANDING,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Dashboard => "/dashboard",
            Route::Expenses => "/expenses",
            Route::Income => "/income",
            Route::Budgets => "/budgets",
            Route::Accounts => "/accounts",
            Route::Goals => "/goals",
            Route::Recurring => "/recurring",
            Route::Reports => "/reports",
            Route::ImportExport => "/import-export",
            Route::Debts => "/debts",
            Route::Households => "/households",
            Route::Tax => "/tax",
            Route::Calendar => "/calendar",
            Route::Achievements => "/achievements",
            Route::Splits => "/splits",
            Route::Profile => "/profile",
        }
    }

    /// Routes reachable without an authenticated session.
    pub fn is_public(&self) -> bool {
        matches!(self, Route::Login | Route::Register)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Bootstrap still in flight; show a loading surface, render nothing
    /// protected yet.
    Loading,
    RedirectToLogin,
    Render(Route),
}

/// Decides what to show for a requested route given the session state.
pub struct AccessGate;

impl AccessGate {
    pub fn decide(session: &Session, route: Route) -> GateDecision {
        if route.is_public() {
            return GateDecision::Render(route);
        }
        if session.bootstrapping {
            return GateDecision::Loading;
        }
        if !session.authenticated {
            return GateDecision::RedirectToLogin;
        }
        GateDecision::Render(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(authenticated: bool, bootstrapping: bool) -> Session {
        Session {
            user: None,
            access_token: None,
            refresh_token: None,
            authenticated,
            bootstrapping,
        }
    }

    #[test]
    fn public_routes_render_regardless_of_session() {
        let s = session(false, true);
        assert_eq!(
            AccessGate::decide(&s, Route::Login),
            GateDecision::Render(Route::Login)
        );
        assert_eq!(
            AccessGate::decide(&s, Route::Register),
            GateDecision::Render(Route::Register)
        );
    }

    #[test]
    fn protected_route_during_bootstrap_shows_loading() {
        let s = session(false, true);
        assert_eq!(
            AccessGate::decide(&s, Route::Dashboard),
            GateDecision::Loading
        );
    }

    #[test]
    fn protected_route_unauthenticated_redirects() {
        let s = session(false, false);
        assert_eq!(
            AccessGate::decide(&s, Route::Expenses),
            GateDecision::RedirectToLogin
        );
    }

    #[test]
    fn protected_route_authenticated_renders() {
        let s = session(true, false);
        assert_eq!(
            AccessGate::decide(&s, Route::Profile),
            GateDecision::Render(Route::Profile)
        );
    }

    #[test]
    fn unknown_paths_fall_back_to_dashboard() {
        assert_eq!(Route::from_path("/no-such-page"), Route::Dashboard);
        assert_eq!(Route::from_path("/"), Route::Dashboard);
    }

    #[test]
    fn paths_round_trip() {
        for route in [
            Route::Login,
            Route::Register,
            Route::Dashboard,
            Route::Expenses,
            Route::Income,
            Route::Budgets,
            Route::Accounts,
            Route::Goals,
            Route::Recurring,
            Route::Reports,
            Route::ImportExport,
            Route::Debts,
            Route::Households,
            Route::Tax,
            Route::Calendar,
            Route::Achievements,
            Route::Splits,
            Route::Profile,
        ] {
            assert_eq!(Route::from_path(route.path()), route);
        }
    }
}
