// [libs/domain/models/src/action.rs]
//! The action-type vocabulary Aedituus authorizes against, shared with
//! the gateway's request surface.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    JobSubmit,
    JobCancel,
    GpuAllocate,
    GpuPreempt,
    DataRead,
    DataWrite,
    DataTrain,
    DataExport,
    BenchmarkRun,
    TunnelOpen,
    MarketplaceList,
    PolicyUpdate,
    SubjectBan,
    InstitutionManage,
    DisputeResolve,
    PayoutRequest,
    RefundIssue,
}
