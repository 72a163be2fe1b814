//! Route types and route set convergence

use ipnet::IpNet;
use std::collections::HashSet;
use std::fmt;
use std::net::IpAddr;

/// A gateway route: traffic for `to` is sent through `via`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Route {
    pub to: IpNet,
    pub via: IpAddr,
}

impl Route {
    pub fn new(to: IpNet, via: IpAddr) -> Self {
        Self { to, via }
    }

    /// Same route with host bits cleared from the destination, the form the kernel reports.
    pub fn normalized(&self) -> Self {
        Self {
            to: self.to.trunc(),
            via: self.via,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} via {}", self.to, self.via)
    }
}

/// Changes needed to turn the installed route set into the desired one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteChanges {
    pub add: Vec<Route>,
    pub remove: Vec<Route>,
}

impl RouteChanges {
    /// Computes the additions and removals converging `installed` to exactly `desired`.
    ///
    /// Destinations are compared after truncation. Order of `desired` is kept for
    /// additions; duplicates in `desired` are added once.
    pub fn between(installed: &[Route], desired: &[Route]) -> Self {
        let installed: HashSet<Route> = installed.iter().map(Route::normalized).collect();
        let wanted: HashSet<Route> = desired.iter().map(Route::normalized).collect();

        let mut seen = HashSet::new();
        let add = desired
            .iter()
            .map(Route::normalized)
            .filter(|r| !installed.contains(r) && seen.insert(*r))
            .collect();

        let mut remove: Vec<Route> = installed
            .iter()
            .filter(|r| !wanted.contains(r))
            .copied()
            .collect();
        remove.sort_by_key(|r| (r.to, r.via));

        Self { add, remove }
    }

    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}
