//! Where jobs live in each flavor

use crate::flavor::ProductFlavor;

/// A job addressed by instance group and job name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobRef {
    pub instance_group: &'static str,
    pub name: &'static str,
}

impl JobRef {
    #[inline]
    #[must_use]
    pub const fn new(instance_group: &'static str, name: &'static str) -> Self {
        Self {
            instance_group,
            name,
        }
    }
}

/// The three Cloud Controller jobs that share the `cc` property tree
#[must_use]
pub fn cloud_controller_jobs(flavor: ProductFlavor) -> [JobRef; 3] {
    match flavor {
        ProductFlavor::Srt => [
            JobRef::new("control", "cloud_controller_ng"),
            JobRef::new("control", "cloud_controller_worker"),
            JobRef::new("control", "cloud_controller_clock"),
        ],
        ProductFlavor::Ert => [
            JobRef::new("cloud_controller", "cloud_controller_ng"),
            JobRef::new("cloud_controller_worker", "cloud_controller_worker"),
            JobRef::new("clock_global", "cloud_controller_clock"),
        ],
    }
}

/// Instance group carrying the autoscaling errands
#[must_use]
pub const fn autoscaling_instance_group(flavor: ProductFlavor) -> &'static str {
    match flavor {
        ProductFlavor::Srt => "control",
        ProductFlavor::Ert => "clock_global",
    }
}
