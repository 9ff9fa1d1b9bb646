use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::assets::avatar::AvatarHandle;
use crate::config::RenderConfig;
use crate::export::{ExportParams, GifArtifact, export_animation_at, now_ms};
use crate::foundation::error::{MemeError, MemeResult};
use crate::store::{HISTORY_LIMIT, HistoryRecord, HistoryStore, Settings, SettingsStore};
use crate::text::FontBook;

/// Result of a successful export.
///
/// A failed history save does not lose the GIF: `artifact` is always present and `saved`
/// carries the store's verdict.
#[derive(Debug)]
pub struct ExportOutcome {
    pub artifact: GifArtifact,
    pub saved: MemeResult<HistoryRecord>,
}

/// One user's editing session: the current config, the avatar being decoded for it, the VIP
/// flag, and the stores behind them.
///
/// All methods take `&self`; a session can be shared between a UI thread and an export thread.
pub struct MemeSession<H, S> {
    history: Mutex<H>,
    settings: Mutex<S>,
    state: Mutex<State>,
    fonts: FontBook,
    params: ExportParams,
    busy: BusyFlag,
}

struct State {
    config: RenderConfig,
    is_vip: bool,
    avatar: AvatarHandle,
}

impl<H: HistoryStore, S: SettingsStore> MemeSession<H, S> {
    /// Restore the last saved config and VIP flag from `settings`.
    pub fn open(history: H, settings: S, fonts: FontBook) -> MemeResult<Self> {
        let Settings {
            is_vip,
            saved_config,
        } = settings.load()?;
        let config = saved_config.unwrap_or_default();
        let avatar = AvatarHandle::for_source(config.avatar_image.as_deref());
        Ok(Self {
            history: Mutex::new(history),
            settings: Mutex::new(settings),
            state: Mutex::new(State {
                config,
                is_vip,
                avatar,
            }),
            fonts,
            params: ExportParams::default(),
            busy: BusyFlag::default(),
        })
    }

    pub fn with_params(mut self, params: ExportParams) -> Self {
        self.params = params;
        self
    }

    pub fn params(&self) -> &ExportParams {
        &self.params
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    pub fn config(&self) -> RenderConfig {
        lock(&self.state).config.clone()
    }

    pub fn avatar(&self) -> AvatarHandle {
        lock(&self.state).avatar.clone()
    }

    pub fn is_vip(&self) -> bool {
        lock(&self.state).is_vip
    }

    pub fn is_exporting(&self) -> bool {
        self.busy.is_set()
    }

    /// Replace the config and persist it. A changed avatar source starts a new decode.
    pub fn set_config(&self, config: RenderConfig) -> MemeResult<()> {
        let settings = {
            let mut state = lock(&self.state);
            if state.avatar.source() != config.avatar_image.as_deref() {
                state.avatar = AvatarHandle::for_source(config.avatar_image.as_deref());
            }
            state.config = config;
            state.settings()
        };
        lock(&self.settings).save(&settings)
    }

    pub fn unlock_vip(&self) -> MemeResult<()> {
        let settings = {
            let mut state = lock(&self.state);
            state.is_vip = true;
            state.settings()
        };
        lock(&self.settings).save(&settings)?;
        tracing::info!("vip unlocked");
        Ok(())
    }

    /// Export the current config and record it in history.
    ///
    /// Fails with [`MemeError::VipRequired`] for VIP-only animations when the session is not VIP,
    /// and with [`MemeError::Busy`] while another export on this session is running.
    pub fn export(&self) -> MemeResult<ExportOutcome> {
        let (config, is_vip, avatar) = {
            let state = lock(&self.state);
            (state.config.clone(), state.is_vip, state.avatar.clone())
        };
        if config.animation_type.requires_vip() && !is_vip {
            return Err(MemeError::VipRequired(config.animation_type.to_string()));
        }

        let _guard = self.busy.try_acquire().ok_or(MemeError::Busy)?;
        let image = avatar.wait();
        let created_at_ms = now_ms();
        let artifact =
            export_animation_at(&config, image.as_deref(), &self.fonts, &self.params, created_at_ms)?;

        let saved = lock(&self.history).save(&config, created_at_ms);
        if let Err(e) = &saved {
            tracing::warn!(error = %e, "export finished but history save failed");
        }
        Ok(ExportOutcome { artifact, saved })
    }

    pub fn history(&self) -> MemeResult<Vec<HistoryRecord>> {
        lock(&self.history).list(HISTORY_LIMIT)
    }

    pub fn delete_history(&self, id: &str) -> MemeResult<bool> {
        lock(&self.history).delete(id)
    }

    /// Make a saved record's config the current one.
    pub fn load_history_item(&self, id: &str) -> MemeResult<RenderConfig> {
        let record = lock(&self.history)
            .get(id)?
            .ok_or_else(|| MemeError::validation(format!("no history record '{id}'")))?;
        self.set_config(record.config.clone())?;
        Ok(record.config)
    }
}

impl State {
    fn settings(&self) -> Settings {
        Settings {
            is_vip: self.is_vip,
            saved_config: Some(self.config.clone()),
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Single-holder flag; the guard clears it on drop, including on early returns.
#[derive(Debug, Default)]
struct BusyFlag(AtomicBool);

struct BusyGuard<'a>(&'a AtomicBool);

impl BusyFlag {
    fn try_acquire(&self) -> Option<BusyGuard<'_>> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(&self.0))
    }

    fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
