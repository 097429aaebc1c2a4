use std::{fmt, str::FromStr};

use super::Record;

/// The status of an access request.
///
/// Requests start out `Pending` and move exactly once, to `Approved` or
/// `Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestStatus {
    /// Awaiting an administrator's decision.
    Pending,
    /// Granted by an administrator.
    Approved,
    /// Declined by an administrator.
    Rejected,
}

impl RequestStatus {
    /// The text stored in the `status` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }

    /// Whether no further transition is allowed out of this status.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status column holds an unknown value.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown request status '{0}'")]
pub struct UnknownStatusError(String);

impl FromStr for RequestStatus {
    type Err = UnknownStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Approved" => Ok(Self::Approved),
            "Rejected" => Ok(Self::Rejected),
            other => Err(UnknownStatusError(other.to_string())),
        }
    }
}

/// The result of applying [`transition`] to a request table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The request's status was changed.
    Applied {
        /// The status before the change.
        from: RequestStatus,
        /// The status after the change.
        to: RequestStatus,
    },
    /// No request has the given id. The table is unchanged.
    NotFound,
    /// The request has already been decided. The table is unchanged.
    AlreadyFinal(RequestStatus),
    /// The target status cannot be reached by a transition. The table is
    /// unchanged.
    Illegal(RequestStatus),
}

impl Transition {
    /// Whether the table was modified.
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Moves the first request whose `request_id` matches to `new_status`.
///
/// The table is mutated in place. Only `Pending → Approved` and
/// `Pending → Rejected` are applied; a blank or unrecognised current status is
/// treated as `Pending`. Every other case leaves the table untouched and is
/// reported through the returned [`Transition`].
pub fn transition(
    requests: &mut [Record],
    request_id: &str,
    new_status: RequestStatus,
) -> Transition {
    if !new_status.is_final() {
        return Transition::Illegal(new_status);
    }

    let Some(request) = requests
        .iter_mut()
        .find(|r| r.value("request_id") == request_id)
    else {
        tracing::debug!("no request with id {request_id}");
        return Transition::NotFound;
    };

    let current = request
        .value("status")
        .parse::<RequestStatus>()
        .unwrap_or_else(|e| {
            tracing::debug!("request {request_id}: {e}, treating as pending");
            RequestStatus::Pending
        });

    if current.is_final() {
        return Transition::AlreadyFinal(current);
    }

    request.set("status", new_status.as_str());
    Transition::Applied {
        from: current,
        to: new_status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: &str, status: &str) -> Record {
        Record::new()
            .with("request_id", id)
            .with("username", "alice")
            .with("status", status)
    }

    fn table() -> Vec<Record> {
        vec![
            request("R001", "Pending"),
            request("R002", "Approved"),
            request("C003", "Pending"),
        ]
    }

    #[test]
    fn approves_pending_request() {
        let mut requests = table();
        let outcome = transition(&mut requests, "R001", RequestStatus::Approved);

        assert_eq!(
            outcome,
            Transition::Applied {
                from: RequestStatus::Pending,
                to: RequestStatus::Approved
            }
        );
        assert_eq!(requests[0].value("status"), "Approved");
        assert_eq!(requests[2].value("status"), "Pending");
    }

    #[test]
    fn rejects_support_contact() {
        let mut requests = table();
        let outcome = transition(&mut requests, "C003", RequestStatus::Rejected);
        assert!(outcome.is_applied());
        assert_eq!(requests[2].value("status"), "Rejected");
    }

    #[test]
    fn unknown_id_leaves_table_identical() {
        let mut requests = table();
        let outcome = transition(&mut requests, "R999", RequestStatus::Approved);
        assert_eq!(outcome, Transition::NotFound);
        assert_eq!(requests, table());
    }

    #[test]
    fn decided_requests_are_terminal() {
        let mut requests = table();
        let outcome = transition(&mut requests, "R002", RequestStatus::Rejected);
        assert_eq!(outcome, Transition::AlreadyFinal(RequestStatus::Approved));
        assert_eq!(requests, table());
    }

    #[test]
    fn cannot_move_back_to_pending() {
        let mut requests = table();
        let outcome = transition(&mut requests, "R001", RequestStatus::Pending);
        assert_eq!(outcome, Transition::Illegal(RequestStatus::Pending));
        assert_eq!(requests, table());
    }

    #[test]
    fn only_first_match_changes() {
        let mut requests = vec![request("R001", "Pending"), request("R001", "Pending")];
        transition(&mut requests, "R001", RequestStatus::Approved);
        assert_eq!(requests[0].value("status"), "Approved");
        assert_eq!(requests[1].value("status"), "Pending");
    }

    #[test]
    fn blank_status_counts_as_pending() {
        let mut requests = vec![request("R001", "")];
        let outcome = transition(&mut requests, "R001", RequestStatus::Approved);
        assert!(outcome.is_applied());
    }
}
