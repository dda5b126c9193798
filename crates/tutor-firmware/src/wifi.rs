//! WiFi station bring-up
//!
//! One connection attempt with a timeout and no retry. The caller shows
//! the WiFi error page when this fails.

use alloc::string::ToString;

use embassy_executor::Spawner;
use embassy_net::{Runner, Stack, StackResources};
use embassy_time::{Duration, with_timeout};
use esp_radio::wifi::{ClientConfig, ModeConfig, WifiController, WifiDevice, WifiEvent};
use log::{info, warn};
use static_cell::StaticCell;
use tutor_core::app_state::AppError;
use tutor_core::config::InternetConfig;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(20);
const DHCP_TIMEOUT: Duration = Duration::from_secs(15);

/// DNS, one TCP socket, and headroom for DHCP
const SOCKET_COUNT: usize = 3;

static RADIO: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();
static RESOURCES: StaticCell<StackResources<SOCKET_COUNT>> = StaticCell::new();

fn wifi_error(message: &str) -> AppError {
    AppError::Wifi(tutor_core::app_state::FromUnchecked::from_unchecked(message))
}

/// Join `internet.ssid` and wait for a DHCP lease.
pub async fn connect(
    spawner: &Spawner,
    wifi: esp_hal::peripherals::WIFI<'static>,
    internet: &InternetConfig<'_>,
    seed: u64,
) -> Result<Stack<'static>, AppError> {
    internet.validate()?;

    let radio = esp_radio::init().map_err(AppError::wifi)?;
    let radio = RADIO.init(radio);
    let (mut controller, interfaces) =
        esp_radio::wifi::new(radio, wifi, Default::default()).map_err(AppError::wifi)?;

    let client = ClientConfig::default()
        .with_ssid(internet.ssid.to_string())
        .with_password(internet.password.to_string());
    controller
        .set_config(&ModeConfig::Client(client))
        .map_err(AppError::wifi)?;
    controller.start_async().await.map_err(AppError::wifi)?;

    info!("Connecting to {}", internet.ssid);
    match with_timeout(CONNECT_TIMEOUT, controller.connect_async()).await {
        Ok(Ok(())) => info!("WiFi associated"),
        Ok(Err(e)) => return Err(AppError::wifi(e)),
        Err(_) => return Err(wifi_error("association timed out")),
    }

    let (stack, runner) = embassy_net::new(
        interfaces.sta,
        embassy_net::Config::dhcpv4(Default::default()),
        RESOURCES.init(StackResources::new()),
        seed,
    );

    spawner
        .spawn(net_task(runner))
        .map_err(|_| wifi_error("could not spawn network task"))?;
    spawner
        .spawn(link_task(controller))
        .map_err(|_| wifi_error("could not spawn link task"))?;

    if with_timeout(DHCP_TIMEOUT, stack.wait_config_up()).await.is_err() {
        return Err(wifi_error("no DHCP lease"));
    }
    if let Some(config) = stack.config_v4() {
        info!("IP address {}", config.address);
    }

    Ok(stack)
}

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}

/// Owns the controller for the lifetime of the link. A dropped link is
/// only logged; requests made afterwards fail and degrade like any other
/// network error.
#[embassy_executor::task]
async fn link_task(mut controller: WifiController<'static>) -> ! {
    loop {
        controller.wait_for_event(WifiEvent::StaDisconnected).await;
        warn!("WiFi link lost");
    }
}
