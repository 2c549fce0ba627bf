//! One-shot hardware peripheral initialization.
//!
//! Configures the ADC1 oneshot unit for both current transformers, the
//! digital inputs, and the flow-meter pulse interrupts using raw ESP-IDF
//! sys calls. Called once from `main()` before the driver loop starts.
//!
//! The indicator LEDs are not touched here: they are owned as
//! `PinDriver`s and handed to [`ChannelLeds`](super::status_led::ChannelLeds).

#[cfg(target_os = "espidf")]
use core::sync::atomic::{AtomicPtr, Ordering};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::error::SensorError;
#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the driver loop; single-threaded.
    unsafe {
        init_adc()?;
        init_gpio_inputs()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

/// Written once by `init_adc`, read by every current measurement.
#[cfg(target_os = "espidf")]
static ADC1_HANDLE: AtomicPtr<adc_oneshot_unit_ctx_t> = AtomicPtr::new(core::ptr::null_mut());

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    let mut handle: adc_oneshot_unit_handle_t = core::ptr::null_mut();
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &mut handle) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: pins::CT_ADC_ATTEN,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    for channel in [pins::CH1_CT_ADC_CHANNEL, pins::CH2_CT_ADC_CHANNEL] {
        let ret = unsafe { adc_oneshot_config_channel(handle, channel, &chan_cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::AdcInitFailed(ret));
        }
    }

    ADC1_HANDLE.store(handle, Ordering::Release);
    info!(
        "hw_init: ADC1 configured (CH{}=CT1, CH{}=CT2)",
        pins::CH1_CT_ADC_CHANNEL,
        pins::CH2_CT_ADC_CHANNEL
    );
    Ok(())
}

/// One raw 12-bit conversion.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Result<u16, SensorError> {
    let handle = ADC1_HANDLE.load(Ordering::Acquire);
    if handle.is_null() {
        return Err(SensorError::NotInitialised);
    }
    let mut raw: i32 = 0;
    // SAFETY: the handle was created by init_adc() and is never freed.
    let ret = unsafe { adc_oneshot_read(handle, channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return Err(SensorError::AdcReadFailed);
    }
    Ok(raw.clamp(0, 4095) as u16)
}

// ── GPIO Inputs ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    // Pins 32-39 are input-only with no internal pulls; the board has
    // external resistors on every input.
    let level_pins = [
        pins::CH1_DRAIN_GPIO,
        pins::CH2_DRAIN_GPIO,
        pins::CH1_MODE_GPIO,
        pins::CH2_MODE_GPIO,
    ];
    for &pin in &level_pins {
        unsafe { config_input(pin, gpio_int_type_t_GPIO_INTR_DISABLE)? };
    }

    for &pin in &[pins::CH1_FLOW_GPIO, pins::CH2_FLOW_GPIO] {
        unsafe { config_input(pin, gpio_int_type_t_GPIO_INTR_NEGEDGE)? };
    }

    info!("hw_init: GPIO inputs configured");
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn config_input(pin: i32, intr_type: gpio_int_type_t) -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured input pin.
    (unsafe { gpio_get_level(pin) }) != 0
}

// ── GPIO ISR Service ──────────────────────────────────────────

/// `arg` carries the channel index (0 or 1), not a real pointer.
#[cfg(target_os = "espidf")]
unsafe extern "C" fn flow_gpio_isr(arg: *mut core::ffi::c_void) {
    crate::sensors::flow::flow_isr_handler(arg as usize);
}

/// Install the per-pin ISR service and hook both flow meters.
/// Call after [`init_peripherals`].
#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), HwInitError> {
    // SAFETY: ESP_ERR_INVALID_STATE means the service is already
    // installed. The handlers only touch atomics.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        for (index, pin) in [pins::CH1_FLOW_GPIO, pins::CH2_FLOW_GPIO].into_iter().enumerate() {
            let ret = gpio_isr_handler_add(pin, Some(flow_gpio_isr), index as *mut core::ffi::c_void);
            if ret != ESP_OK as i32 {
                return Err(HwInitError::IsrInstallFailed(ret));
            }
            gpio_intr_enable(pin);
        }

        info!("hw_init: ISR service installed (flow x2)");
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}
