use crate::config::save::save_settings;
use crate::config::{Config, Language, NormalizeProfile, SlideshowEffect};
use crate::menu::handlers::{
    run_clear_frame_extractor, run_slideshow_builder, run_trailer_builder, run_video_cutter,
    run_video_merger,
};
use anyhow::Result;
use console::{Term, style};
use dialoguer::Select;
use dialoguer::theme::ColorfulTheme;
use rust_i18n::t;
use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub fn show_main_menu(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &mut Config,
) -> Result<bool> {
    term.clear_screen()?;

    println!("{}", style(t!("main_menu.title")).cyan().bold());
    println!("{}", style(t!("common.esc_hint")).dim());

    let options = vec![
        t!("main_menu.opt_clear_frames"),
        t!("main_menu.opt_slideshow"),
        t!("main_menu.opt_trailer"),
        t!("main_menu.opt_merger"),
        t!("main_menu.opt_cutter"),
        t!("main_menu.opt_settings"),
        t!("main_menu.exit"),
    ];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("main_menu.prompt"))
        .items(&options)
        .default(0)
        .interact_on_opt(term)?;

    match selection {
        Some(0) => run_clear_frame_extractor(term, shutdown_signal, config)?,
        Some(1) => run_slideshow_builder(term, shutdown_signal, config)?,
        Some(2) => run_trailer_builder(term, shutdown_signal, config)?,
        Some(3) => run_video_merger(term, shutdown_signal, config)?,
        Some(4) => run_video_cutter(term, config)?,
        Some(5) => show_settings_menu(term, config)?,
        Some(6) | None => return Ok(false),
        _ => unreachable!(),
    }

    Ok(true)
}

/// 設定選單
fn show_settings_menu(term: &Term, config: &mut Config) -> Result<()> {
    loop {
        term.clear_screen()?;

        println!("{}", style(t!("settings.title")).cyan().bold());
        println!("{}", style(t!("common.esc_hint")).dim());

        let options = vec![
            t!("settings.opt_slideshow_effect"),
            t!("settings.opt_merge_profile"),
            t!("settings.opt_language"),
            t!("settings.back"),
        ];

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(t!("settings.prompt"))
            .items(&options)
            .default(0)
            .interact_on_opt(term)?;

        match selection {
            Some(0) => {
                let effects = [
                    SlideshowEffect::ZoomPan,
                    SlideshowEffect::Plain,
                    SlideshowEffect::Scaled,
                ];
                if let Some(effect) = choose(
                    term,
                    &t!("settings.slideshow_effect.title"),
                    &effects,
                    config.settings.slideshow.effect,
                )? {
                    config.settings.slideshow.effect = effect;
                    save_and_confirm(config, effect)?;
                }
            }
            Some(1) => {
                let profiles = [
                    NormalizeProfile::Standard,
                    NormalizeProfile::Hd1080,
                    NormalizeProfile::StreamCopy,
                ];
                if let Some(profile) = choose(
                    term,
                    &t!("settings.merge_profile.title"),
                    &profiles,
                    config.settings.merger.profile,
                )? {
                    config.settings.merger.profile = profile;
                    save_and_confirm(config, profile)?;
                }
            }
            Some(2) => {
                let languages = [Language::EnUs, Language::ZhTw];
                if let Some(language) = choose(
                    term,
                    &t!("settings.language.title"),
                    &languages,
                    config.settings.language,
                )? {
                    config.settings.language = language;
                    rust_i18n::set_locale(language.as_str());
                    save_and_confirm(config, language)?;
                }
            }
            Some(3) | None => break,
            _ => unreachable!(),
        }
    }

    Ok(())
}

/// 顯示選項並回傳新的選擇；按 ESC 或選擇與目前相同時回傳 None
fn choose<T: Copy + PartialEq + Display>(
    term: &Term,
    title: &str,
    choices: &[T],
    current: T,
) -> Result<Option<T>> {
    term.clear_screen()?;

    println!("{}", style(title).cyan().bold());
    println!("{}", style(t!("common.esc_hint")).dim());
    println!("\n{} {}", style(t!("settings.current")).dim(), current);
    println!();

    let items: Vec<String> = choices.iter().map(ToString::to_string).collect();
    let default_index = choices.iter().position(|&c| c == current).unwrap_or(0);

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("settings.choose"))
        .items(&items)
        .default(default_index)
        .interact_on_opt(term)?;

    Ok(selection
        .map(|index| choices[index])
        .filter(|&choice| choice != current))
}

fn save_and_confirm(config: &Config, value: impl Display) -> Result<()> {
    save_settings(&config.settings)?;
    println!("\n{} {}", style(t!("settings.saved")).green(), value);
    std::thread::sleep(std::time::Duration::from_secs(1));
    Ok(())
}
