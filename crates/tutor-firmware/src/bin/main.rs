#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use embassy_executor::Spawner;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Delay, Duration, Timer};
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::rng::Rng;
use esp_hal::spi::master::{Config as SpiConfig, Spi};
use esp_hal::time::Rate;
use esp_hal::timer::timg::TimerGroup;
use esp_hal::Async;
use log::{error, info, warn};
use static_cell::StaticCell;

// Display-LCD panel specific imports
use embedded_hal_bus::spi::ExclusiveDevice;
use mipidsi::interface::SpiInterface;
use mipidsi::options::{Orientation, Rotation};
use mipidsi::Builder as MipidsiBuilder;

use tutor_core::app::App;
use tutor_core::drivers::{Hx8357D, SeesawGamepad, SharedI2cDevice, Tsc2007};
use tutor_core::framebuffer::{BufferedDisplay, DisplaySurface};
use tutor_core::ui::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};
use tutor_core::http::Redirecting;
use tutor_core::image;
use tutor_core::pages::{Page, WifiErrorPage};
use tutor_firmware::clock::EmbassyClock;
use tutor_firmware::net::NetClient;
use tutor_firmware::rng::DeviceRng;
use tutor_firmware::{wifi, wifi_secrets};

/// Shown on the start screen under the title
static START_IMAGE: &[u8] = include_bytes!("../../assets/start_image.bmp");

static I2C_BUS: StaticCell<Mutex<CriticalSectionRawMutex, I2c<'static, Async>>> = StaticCell::new();

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

/// Nothing left to do; keep the last screen up.
async fn halt() -> ! {
    loop {
        Timer::after(Duration::from_secs(1)).await;
    }
}

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);
    // Framebuffer, card image and TLS buffers all live in PSRAM
    esp_alloc::psram_allocator!(peripherals.PSRAM, esp_hal::psram);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("Embassy initialized!");

    // 1. Display on its own SPI bus, CS driven by the SPI device wrapper
    let spi_bus = Spi::new(
        peripherals.SPI2,
        SpiConfig::default().with_frequency(Rate::from_mhz(40)),
    )
    .unwrap()
    .with_sck(peripherals.GPIO36)
    .with_mosi(peripherals.GPIO35);
    let cs = Output::new(peripherals.GPIO9, Level::High, OutputConfig::default());
    let spi_device = ExclusiveDevice::new_no_delay(spi_bus, cs).unwrap();
    let dc = Output::new(peripherals.GPIO10, Level::Low, OutputConfig::default());

    // Batches pixel data into larger SPI transfers
    let mut spi_buffer = [0u8; 512];
    let di = SpiInterface::new(spi_device, dc, &mut spi_buffer);

    // The panel is mounted upside down in the enclosure
    let panel = MipidsiBuilder::new(Hx8357D, di)
        .display_size(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX)
        .orientation(Orientation::new().rotate(Rotation::Deg180))
        .init(&mut Delay)
        .expect("Failed to initialize display");
    let mut surface = BufferedDisplay::new(panel);

    info!("Display initialized!");

    // 2. WiFi, shown as an error page if it cannot come up
    let device_config = match wifi_secrets::device_config() {
        Ok(config) => config,
        Err(err) => {
            error!("Invalid configuration: {}", err);
            let mut page = WifiErrorPage::with_message("Invalid configuration", wifi_secrets::WIFI_SSID);
            if page.draw_page(&mut surface).and_then(|()| surface.present()).is_err() {
                error!("Could not draw the configuration error page");
            }
            halt().await
        }
    };
    let mut rng = DeviceRng::new(Rng::new());
    let stack = match wifi::connect(
        &spawner,
        peripherals.WIFI,
        &device_config.internet,
        rng.seed(),
    )
    .await
    {
        Ok(stack) => stack,
        Err(err) => {
            error!("{}", err);
            let mut page = WifiErrorPage::with_message("WiFi connection failed", device_config.internet.ssid);
            if page.draw_page(&mut surface).and_then(|()| surface.present()).is_err() {
                error!("Could not draw the WiFi error page");
            }
            halt().await
        }
    };

    // 3. Gamepad and touch share the STEMMA QT bus
    let i2c = I2c::new(
        peripherals.I2C0,
        I2cConfig::default().with_frequency(Rate::from_khz(400)),
    )
    .unwrap()
    .with_sda(peripherals.GPIO3)
    .with_scl(peripherals.GPIO4)
    .into_async();
    let i2c_bus = I2C_BUS.init(Mutex::new(i2c));

    let gamepad = SeesawGamepad::new(SharedI2cDevice::new(i2c_bus), Delay);
    let touch = Tsc2007::new(SharedI2cDevice::new(i2c_bus));
    let http = Redirecting::new(NetClient::new(stack, rng));

    let mut app = App::new(gamepad, touch, http, surface, EmbassyClock)
        .with_timing(device_config.timing)
        .with_search_url(device_config.api.search_url);
    match image::decode(START_IMAGE) {
        Ok(splash) => app = app.with_splash(splash),
        Err(err) => warn!("Start image unusable: {}", err),
    }

    info!("Personal Tutor ready");
    let err = app.run().await;
    error!("Personal Tutor stopped: {}", err);
    halt().await
}
