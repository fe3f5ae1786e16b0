//! Data partition mount.
//!
//! The application bundle, the backup snapshot, and the orchestrator's
//! markers all live on a wear-levelled FAT partition (label `storage`)
//! mounted at `/data`.  Mounting happens once, before the orchestrator
//! runs; failure here is fatal for updates, so it surfaces as an error
//! rather than a `false`.
//!
//! On the host the "partition" is a directory, overridable through
//! `TANKMON_DATA_DIR` so simulation runs can be pointed anywhere.

use std::path::PathBuf;

use log::{info, warn};

use crate::error::CommsError;

pub const DATA_MOUNT_POINT: &str = "/data";

#[cfg(target_os = "espidf")]
const PARTITION_LABEL: &core::ffi::CStr = c"storage";

/// Mount the data partition and return its root.
#[cfg(target_os = "espidf")]
pub fn mount_data_partition() -> Result<PathBuf, CommsError> {
    use esp_idf_svc::sys::*;

    let mount_cfg = esp_vfs_fat_mount_config_t {
        // Virgin flash carries no filesystem; first boot formats it.
        format_if_mount_failed: true,
        max_files: 8,
        allocation_unit_size: 4096,
        disk_status_check_enable: false,
        ..Default::default()
    };

    // Handle only matters for unmount, which never happens.
    let mut wl_handle: wl_handle_t = Default::default();
    let mount_point: &core::ffi::CStr = c"/data";
    // SAFETY: both strings are NUL-terminated and the config outlives
    // the call; single-threaded boot path.
    let ret = unsafe {
        esp_vfs_fat_spiflash_mount_rw_wl(
            mount_point.as_ptr(),
            PARTITION_LABEL.as_ptr(),
            &mount_cfg,
            &mut wl_handle,
        )
    };
    if ret != ESP_OK {
        warn!("vfs: data partition mount failed (rc={ret})");
        return Err(CommsError::VfsMountFailed);
    }
    info!("vfs: data partition mounted at {DATA_MOUNT_POINT}");
    Ok(PathBuf::from(DATA_MOUNT_POINT))
}

/// Host stand-in: a plain directory, created on demand.
#[cfg(not(target_os = "espidf"))]
pub fn mount_data_partition() -> Result<PathBuf, CommsError> {
    let root = std::env::var_os("TANKMON_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./data"));
    std::fs::create_dir_all(&root).map_err(|e| {
        warn!("vfs(sim): cannot create {}: {e}", root.display());
        CommsError::VfsMountFailed
    })?;
    info!("vfs(sim): data root at {}", root.display());
    Ok(root)
}
