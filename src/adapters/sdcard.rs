//! SD card adapter.
//!
//! Implements the [`VolumeMount`] port: SD card on the SPI2 host,
//! FAT filesystem mounted read-only at `/sdcard` through the ESP-IDF
//! VFS.  Mount failure is expected (no card inserted) and reported as
//! `false`, never as a hard error — the arbiter just moves on.
//!
//! On the host the "card" is a plain directory: present means mounted.

use std::path::{Path, PathBuf};

use log::info;

use crate::ports::VolumeMount;

#[cfg(target_os = "espidf")]
use crate::pins;

pub const MOUNT_POINT: &str = "/sdcard";

pub struct SdCardVolume {
    root: PathBuf,
    mounted: bool,
}

impl SdCardVolume {
    /// Device card socket on the SPI2 host pins.
    #[cfg(target_os = "espidf")]
    pub fn new() -> Self {
        Self {
            root: PathBuf::from(MOUNT_POINT),
            mounted: false,
        }
    }

    /// Host stand-in backed by a directory.
    #[cfg(not(target_os = "espidf"))]
    pub fn simulated(root: PathBuf) -> Self {
        Self {
            root,
            mounted: false,
        }
    }

    #[cfg(target_os = "espidf")]
    fn platform_mount(&mut self) -> bool {
        use core::ffi::CStr;
        use esp_idf_svc::sys::*;
        use log::warn;

        // SPI bus for the card socket.  INVALID_STATE means the bus is
        // already up from a previous attempt, which is fine.
        let mut bus_cfg = spi_bus_config_t::default();
        bus_cfg.__bindgen_anon_1.mosi_io_num = pins::SD_SPI_MOSI_GPIO;
        bus_cfg.__bindgen_anon_2.miso_io_num = pins::SD_SPI_MISO_GPIO;
        bus_cfg.sclk_io_num = pins::SD_SPI_SCLK_GPIO;
        bus_cfg.__bindgen_anon_3.quadwp_io_num = -1;
        bus_cfg.__bindgen_anon_4.quadhd_io_num = -1;
        bus_cfg.max_transfer_sz = 4000;

        // SAFETY: called from the single-threaded boot path; the bus
        // config outlives the call.
        let ret = unsafe {
            spi_bus_initialize(
                spi_host_device_t_SPI2_HOST,
                &bus_cfg,
                spi_common_dma_t_SPI_DMA_CH_AUTO,
            )
        };
        if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
            warn!("sdcard: SPI bus init failed (rc={ret})");
            return false;
        }

        // SDSPI host descriptor, the sys-crate spelling of the C-side
        // SDSPI_HOST_DEFAULT() macro.
        let host = sdmmc_host_t {
            flags: SDMMC_HOST_FLAG_SPI | SDMMC_HOST_FLAG_DEINIT_ARG,
            slot: spi_host_device_t_SPI2_HOST as i32,
            max_freq_khz: SDMMC_FREQ_DEFAULT as i32,
            io_voltage: 3.3,
            init: Some(sdspi_host_init),
            set_bus_width: None,
            get_bus_width: None,
            set_bus_ddr_mode: None,
            set_card_clk: Some(sdspi_host_set_card_clk),
            set_cclk_always_on: None,
            do_transaction: Some(sdspi_host_do_transaction),
            __bindgen_anon_1: sdmmc_host_t__bindgen_ty_1 {
                deinit_p: Some(sdspi_host_remove_device),
            },
            io_int_enable: Some(sdspi_host_io_int_enable),
            io_int_wait: Some(sdspi_host_io_int_wait),
            get_real_freq: Some(sdspi_host_get_real_freq),
            ..Default::default()
        };

        let slot_cfg = sdspi_device_config_t {
            host_id: spi_host_device_t_SPI2_HOST,
            gpio_cs: pins::SD_SPI_CS_GPIO,
            gpio_cd: gpio_num_t_GPIO_NUM_NC,
            gpio_wp: gpio_num_t_GPIO_NUM_NC,
            gpio_int: gpio_num_t_GPIO_NUM_NC,
            ..Default::default()
        };

        let mount_cfg = esp_vfs_fat_sdmmc_mount_config_t {
            format_if_mount_failed: false,
            max_files: 4,
            allocation_unit_size: 16 * 1024,
            disk_status_check_enable: false,
            ..Default::default()
        };

        let mount_point: &CStr = c"/sdcard";
        let mut card: *mut sdmmc_card_t = core::ptr::null_mut();
        // SAFETY: all pointers reference locals that outlive the call;
        // the mount point string is NUL-terminated.
        let ret = unsafe {
            esp_vfs_fat_sdspi_mount(
                mount_point.as_ptr(),
                &host,
                &slot_cfg,
                &mount_cfg,
                &mut card,
            )
        };
        if ret != ESP_OK {
            info!("sdcard: no card mounted (rc={ret})");
            return false;
        }
        info!("sdcard: mounted at {MOUNT_POINT}");
        true
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_mount(&mut self) -> bool {
        let present = self.root.is_dir();
        if present {
            info!("sdcard(sim): mounted at {}", self.root.display());
        } else {
            info!("sdcard(sim): no card at {}", self.root.display());
        }
        present
    }
}

impl VolumeMount for SdCardVolume {
    fn mount(&mut self) -> bool {
        if self.mounted {
            return true;
        }
        self.mounted = self.platform_mount();
        self.mounted
    }

    fn root(&self) -> &Path {
        &self.root
    }
}
