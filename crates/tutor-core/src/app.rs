//! Screen controller
//!
//! [`App`] owns every device seam (gamepad, touch panel, HTTP client,
//! display surface and clock) plus the [`AppState`] that survives screen
//! changes. Each call to [`App::step`] runs one screen until it hands
//! control back; [`App::run`] repeats that until something fatal happens.
//!
//! Start is shown once. After that the device alternates between the
//! search screen and the card screen.

use alloc::string::String;
use core::fmt::Debug;

use embedded_graphics::geometry::Dimensions;
use log::{debug, error, info, warn};

use crate::api::{ApiClient, CardResults, SearchProgress};
use crate::app_state::{AppError, AppState, Screen};
use crate::canvas::CanvasColor;
use crate::config::TimingConfig;
use crate::framebuffer::DisplaySurface;
use crate::http::HttpClient;
use crate::image::{self, Bitmap, CARD_SIZE};
use crate::input::{self, Button, ControllerState, Gamepad};
use crate::pages::{CardPage, Page, SearchPage, StartPage};
use crate::timer::Timer;
use crate::touch::{Calibration, TouchPanel};
use crate::ui::{Drawable, ProgressOverlay};

/// Bar position after `kept` distinct names
fn collected_percent(kept: usize) -> u8 {
    50 + 5 * kept.min(crate::api::MAX_RESULTS) as u8
}

/// Bar position while row `row` of the card is being resampled
fn resize_percent(row: u32) -> u8 {
    60 + (35 * row.min(CARD_SIZE.height) / CARD_SIZE.height) as u8
}

fn activate<P: Page>(page: &mut P) {
    info!("Showing {:?} page ({})", page.id(), page.title());
    page.on_activate();
}

fn deactivate<P: Page>(page: &mut P) {
    debug!("Leaving {} page", page.title());
    page.on_deactivate();
}

/// Draw the dirty parts of `page`, then the overlay if it is up, and
/// push the result to the panel.
fn render<S, P>(surface: &mut S, page: &mut P, progress: &mut ProgressOverlay) -> Result<(), AppError>
where
    S: DisplaySurface,
    S::Error: Debug,
    P: Page,
{
    page.draw_page(surface).map_err(AppError::display)?;
    if progress.is_visible() {
        progress.draw(surface).map_err(AppError::display)?;
        progress.mark_clean();
    }
    surface.present().map_err(AppError::display)
}

pub struct App<G, T, H, S, K> {
    gamepad: G,
    touch: T,
    api: ApiClient<H>,
    surface: S,
    timer: K,
    calibration: Calibration,
    timing: TimingConfig,
    state: AppState,
    start: Option<StartPage>,
    search: SearchPage,
    progress: ProgressOverlay,
}

impl<G, T, H, S, K> App<G, T, H, S, K>
where
    G: Gamepad,
    T: TouchPanel,
    H: HttpClient,
    S: DisplaySurface,
    S::Error: Debug,
    K: Timer,
{
    pub fn new(gamepad: G, touch: T, http: H, surface: S, timer: K) -> Self {
        Self {
            gamepad,
            touch,
            api: ApiClient::new(http),
            surface,
            timer,
            calibration: Calibration::default(),
            timing: TimingConfig::default(),
            state: AppState::new(),
            start: Some(StartPage::new(None)),
            search: SearchPage::new(),
            progress: ProgressOverlay::new(),
        }
    }

    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = calibration;
        self
    }

    /// Point searches at a different endpoint (up to and including `name=`)
    pub fn with_search_url(mut self, search_url: &str) -> Self {
        self.api.set_search_url(search_url);
        self
    }

    /// Image shown on the start page
    pub fn with_splash(mut self, splash: Bitmap) -> Self {
        self.start = Some(StartPage::new(Some(splash)));
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn gamepad(&self) -> &G {
        &self.gamepad
    }

    pub fn timer(&self) -> &K {
        &self.timer
    }

    pub fn http(&self) -> &H {
        self.api.http()
    }

    pub fn search_page(&self) -> &SearchPage {
        &self.search
    }

    /// Run the current screen to completion and move to the next one.
    pub async fn step(&mut self) -> Result<(), AppError> {
        let screen = core::mem::replace(&mut self.state.screen, Screen::Search);
        info!("Entering {:?}", screen);

        let next = match screen {
            Screen::Start => {
                self.start_screen().await?;
                Screen::Search
            }
            Screen::Search => match self.search_screen().await? {
                Some(url) => Screen::Card(url),
                None => Screen::Search,
            },
            Screen::Card(url) => {
                self.card_screen(&url).await?;
                Screen::Search
            }
        };

        self.state.screen = next;
        Ok(())
    }

    /// Step forever. Only returns with the error that stopped the device.
    pub async fn run(&mut self) -> AppError {
        loop {
            if let Err(err) = self.step().await {
                error!("Stopping: {}", err);
                return err;
            }
        }
    }

    async fn read_input(&mut self) -> Result<ControllerState, AppError> {
        self.gamepad.read().await.map_err(AppError::input)
    }

    async fn wait_release(&mut self, button: Button) -> Result<(), AppError> {
        input::wait_button_release(&mut self.gamepad, button, self.timing.poll_limit)
            .await
            .map_err(AppError::input)?;
        Ok(())
    }

    async fn wait_centered(&mut self, last: ControllerState) -> Result<(), AppError> {
        input::wait_stick_centered(&mut self.gamepad, last, self.timing.poll_limit)
            .await
            .map_err(AppError::input)?;
        Ok(())
    }

    fn render_search(&mut self) -> Result<(), AppError> {
        render(&mut self.surface, &mut self.search, &mut self.progress)
    }

    fn update_progress(&mut self, status: &str, percent: u8) -> Result<(), AppError> {
        debug!("Progress {}%: {}", percent, status);
        self.progress.set(status, percent);
        self.render_search()
    }

    /// Red status for the error dwell, then back to the search page
    async fn fail_progress(&mut self, status: &str) -> Result<(), AppError> {
        self.progress.fail(status);
        self.render_search()?;
        self.timer.delay_ms(self.timing.error_dwell_ms).await;
        self.dismiss_progress()
    }

    fn dismiss_progress(&mut self) -> Result<(), AppError> {
        self.progress.hide();
        self.search.mark_dirty();
        self.render_search()
    }

    async fn start_screen(&mut self) -> Result<(), AppError> {
        let Some(mut page) = self.start.take() else {
            return Ok(());
        };

        activate(&mut page);
        render(&mut self.surface, &mut page, &mut self.progress)?;

        loop {
            if self.read_input().await?.is_pressed(Button::Select) {
                self.wait_release(Button::Select).await?;
                break;
            }
        }

        deactivate(&mut page);
        Ok(())
    }

    /// Keyboard mode. Returns the image URL of a chosen card, or `None`
    /// when the user leaves with START.
    async fn search_screen(&mut self) -> Result<Option<String>, AppError> {
        activate(&mut self.search);
        self.search.set_query(self.state.query.as_str());
        self.search.show_results(&self.state.results);
        self.render_search()?;

        loop {
            let input = self.read_input().await?;

            if input.stick_moved() {
                let (columns, rows) = input.grid_step();
                self.search.keyboard_mut().move_cursor(columns, rows);
                self.render_search()?;
                self.wait_centered(input).await?;
            }

            if input.is_pressed(Button::X) {
                self.state.query.push(' ');
                self.query_changed(Button::X).await?;
            }

            if input.is_pressed(Button::A) {
                let ch = self.search.keyboard().selected_char();
                self.state.query.push(ch);
                self.query_changed(Button::A).await?;
            }

            if input.is_pressed(Button::B) {
                self.state.query.pop();
                self.query_changed(Button::B).await?;
            }

            if input.is_pressed(Button::Start) {
                self.wait_release(Button::Start).await?;
                deactivate(&mut self.search);
                return Ok(None);
            }

            let submit = input.is_pressed(Button::Select);
            if submit || input.is_pressed(Button::Y) {
                self.search.keyboard_mut().set_active(false);
                self.render_search()?;

                if submit {
                    self.wait_release(Button::Select).await?;
                    self.state.results = self.load_results().await?;
                    self.search.show_results(&self.state.results);
                    self.render_search()?;
                } else {
                    self.wait_release(Button::Y).await?;
                }

                if let Some(url) = self.browse_results().await? {
                    deactivate(&mut self.search);
                    return Ok(Some(url));
                }

                self.search.keyboard_mut().set_active(true);
                self.render_search()?;
            }
        }
    }

    async fn query_changed(&mut self, button: Button) -> Result<(), AppError> {
        debug!("Query: {:?}", self.state.query.as_str());
        self.search.set_query(self.state.query.as_str());
        self.render_search()?;
        self.wait_release(button).await
    }

    /// Run one search with progress reporting. Failures are shown and
    /// degrade to an empty list.
    async fn load_results(&mut self) -> Result<CardResults, AppError> {
        self.progress.show();
        self.update_progress("Accessing URL", 5)?;

        let mut render_error = None;
        let searched = {
            let Self {
                api,
                surface,
                search,
                progress,
                state,
                ..
            } = self;
            api.search_cards(state.query.as_str(), |step| {
                debug!("Search progress: {:?}", step);
                match step {
                    SearchProgress::Received => progress.set("Response! Making JSON", 20),
                    SearchProgress::Parsed => progress.set("Success! Getting Names", 50),
                    SearchProgress::Collected(kept) => progress.set_percent(collected_percent(kept)),
                }
                if render_error.is_none() {
                    render_error = render(surface, search, progress).err();
                }
            })
            .await
        };
        if let Some(err) = render_error {
            return Err(err);
        }

        let results = match searched {
            Ok(results) => results,
            Err(err) => {
                warn!("Search failed: {}", err);
                self.fail_progress("Failed! Try Again").await?;
                return Ok(CardResults::new());
            }
        };

        self.update_progress("Names Got! Processing", 90)?;
        self.search.show_results(&results);
        self.progress.set_percent(100);
        self.render_search()?;
        self.timer.delay_ms(self.timing.done_dwell_ms).await;
        self.dismiss_progress()?;
        Ok(results)
    }

    /// Result mode. With no results it returns immediately.
    async fn browse_results(&mut self) -> Result<Option<String>, AppError> {
        if self.state.results.is_empty() {
            info!("No results to browse");
            return Ok(None);
        }

        self.search.results_mut().select(0);
        self.render_search()?;

        loop {
            let input = self.read_input().await?;

            let now = self.timer.now_ms();
            if self
                .search
                .results_mut()
                .animate(now, self.timing.scroll_step_ms)
            {
                self.render_search()?;
            }

            if input.stick_moved_vertically() {
                self.search.results_mut().move_selection(input.row_step());
                self.render_search()?;
                self.wait_centered(input).await?;
            }

            if input.is_pressed(Button::Start) {
                self.search.results_mut().clear_selection();
                self.render_search()?;
                self.wait_release(Button::Start).await?;
                return Ok(None);
            }

            if input.is_pressed(Button::A) {
                let selected = self.search.results().selected().unwrap_or(0);
                match self.state.results.get(selected) {
                    Some(card) => {
                        info!("Opening {:?}", card.name.as_str());
                        let url = card.image_url.clone();
                        self.wait_release(Button::A).await?;
                        self.search.results_mut().clear_selection();
                        return Ok(Some(url));
                    }
                    None => debug!("Result slot {} is empty", selected),
                }
            }
        }
    }

    /// Download, decode and show a card, then let the user draw on it
    /// until START. A failed download returns to search; an undecodable
    /// image is fatal.
    async fn card_screen(&mut self, url: &str) -> Result<(), AppError> {
        self.progress.show();
        self.update_progress("Getting Image Bytes", 5)?;

        let bytes = match self.api.fetch_image(url).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("Image download failed: {}", err);
                return self.fail_progress("Failed! Try Again").await;
            }
        };

        self.update_progress("Got Image! Processing", 20)?;
        let decoded = match image::decode(&bytes) {
            Ok(decoded) => decoded,
            Err(err) => {
                error!("Card image could not be decoded: {}", err);
                self.progress.fail("Website is Down!");
                self.render_search()?;
                self.timer.delay_ms(self.timing.error_dwell_ms).await;
                return Err(err.into());
            }
        };
        drop(bytes);

        self.update_progress("Processed! Resizing", 60)?;
        let mut render_error = None;
        let resized = {
            let Self {
                surface,
                search,
                progress,
                ..
            } = self;
            image::resample(&decoded, CARD_SIZE, |row| {
                progress.set_percent(resize_percent(row));
                if progress.is_dirty() && render_error.is_none() {
                    render_error = render(surface, search, progress).err();
                }
            })
        };
        if let Some(err) = render_error {
            return Err(err);
        }
        drop(decoded);

        self.update_progress("Resized! Displaying", 100)?;
        self.timer.delay_ms(self.timing.done_dwell_ms).await;
        self.progress.hide();

        let mut page = CardPage::new(resized);
        activate(&mut page);
        render(&mut self.surface, &mut page, &mut self.progress)?;

        let screen = self.surface.bounding_box().size;
        loop {
            let input = self.read_input().await?;

            if input.is_pressed(Button::Start) {
                self.wait_release(Button::Start).await?;
                break;
            }

            if input.is_pressed(Button::Select) {
                debug!("Clearing canvas");
                page.clear_canvas();
            }

            if let Some(color) = CanvasColor::from_buttons(&input) {
                page.set_brush(color);
            }

            if let Some(raw) = self.touch.read().await.map_err(AppError::touch)? {
                if let Some(point) = self.calibration.map_within(raw, screen) {
                    page.paint(point);
                }
            }

            if page.is_dirty() {
                render(&mut self.surface, &mut page, &mut self.progress)?;
            }
        }

        deactivate(&mut page);
        Ok(())
    }
}
