// [libs/domain/models/src/gpu.rs]
//! GPUs attached to an Atlas node — the allocatable unit of compute.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GpuTier {
    Consumer,
    Prosumer,
    Datacenter,
    Flagship,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PricingMode {
    Fixed,
    Spot,
    Reserved,
    Burst,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pricing {
    pub per_hour_usd: f64,
    pub mode: PricingMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gpu {
    pub gpu_id: Uuid,
    pub node_id: Uuid,
    pub vendor_uuid: String,
    pub tier: GpuTier,
    pub model: String,
    pub vram_gb: f64,
    pub vram_available_gb: f64,
    pub nvlink_capable: bool,
    pub mig_capable: bool,
    pub pricing: Pricing,
    pub power_cap_watts: u32,
    pub allowed_workload_types: Vec<String>,
    pub concurrent_job_limit: u32,
    pub current_jobs: Vec<Uuid>,
    /// Last synthetic benchmark result; `None` until BENCHMARKING completes.
    pub benchmark_score: Option<f64>,
}

impl Gpu {
    /// `0 ≤ vram_available_gb ≤ vram_gb` — the VRAM ledger invariant.
    pub fn vram_invariant_holds(&self) -> bool {
        self.vram_available_gb >= 0.0 && self.vram_available_gb <= self.vram_gb
    }

    pub fn has_capacity_for(&self, requested_vram_gb: f64) -> bool {
        self.vram_available_gb >= requested_vram_gb
            && (self.current_jobs.len() as u32) < self.concurrent_job_limit
    }

    /// Reserves `vram_gb` for `job_id`; caller has already checked
    /// capacity. Returns `false` (no-op) if the reservation would
    /// violate the VRAM invariant.
    pub fn reserve(&mut self, job_id: Uuid, vram_gb: f64) -> bool {
        if vram_gb > self.vram_available_gb {
            return false;
        }
        self.vram_available_gb -= vram_gb;
        self.current_jobs.push(job_id);
        true
    }

    /// Restores `vram_gb` and drops `job_id` from the active list. Clamps
    /// to `vram_gb` so a double-release can never overshoot the ceiling.
    pub fn release(&mut self, job_id: Uuid, vram_gb: f64) {
        self.vram_available_gb = (self.vram_available_gb + vram_gb).min(self.vram_gb);
        self.current_jobs.retain(|j| *j != job_id);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterGpuRequest {
    pub node_id: Uuid,
    pub vendor_uuid: String,
    pub tier: GpuTier,
    pub model: String,
    pub vram_gb: f64,
    pub nvlink_capable: bool,
    pub mig_capable: bool,
    pub pricing: Pricing,
    pub power_cap_watts: u32,
    pub allowed_workload_types: Vec<String>,
    pub concurrent_job_limit: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gpu() -> Gpu {
        Gpu {
            gpu_id: Uuid::new_v4(),
            node_id: Uuid::new_v4(),
            vendor_uuid: "GPU-0".into(),
            tier: GpuTier::Datacenter,
            model: "H100".into(),
            vram_gb: 80.0,
            vram_available_gb: 80.0,
            nvlink_capable: true,
            mig_capable: false,
            pricing: Pricing { per_hour_usd: 2.0, mode: PricingMode::Fixed },
            power_cap_watts: 700,
            allowed_workload_types: vec!["inference".into(), "training".into()],
            concurrent_job_limit: 4,
            current_jobs: vec![],
            benchmark_score: Some(95.0),
        }
    }

    #[test]
    fn release_after_reserve_restores_vram_exactly_once() {
        let mut g = gpu();
        let job = Uuid::new_v4();
        assert!(g.reserve(job, 16.0));
        assert_eq!(g.vram_available_gb, 64.0);

        g.release(job, 16.0);
        assert_eq!(g.vram_available_gb, 80.0);

        // A second release for the same job must not double-credit.
        g.release(job, 16.0);
        assert_eq!(g.vram_available_gb, 80.0);
        assert!(g.vram_invariant_holds());
    }

    #[test]
    fn reserve_beyond_availability_is_rejected() {
        let mut g = gpu();
        let job = Uuid::new_v4();
        assert!(!g.reserve(job, 200.0));
        assert_eq!(g.vram_available_gb, 80.0);
    }
}
