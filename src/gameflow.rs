use crate::prelude::*;
use bevy::app::AppExit;
use bevy::ui::GlobalZIndex;

#[derive(States, Debug, Hash, PartialEq, Eq, Clone, Copy, Default)]
pub enum GameState {
    #[default]
    MainMenu,
    InGame,
    /// One-frame detour so leaving and re-entering `InGame` rebuilds the level.
    Reloading,
}

/// Scene lifecycle requests raised by gameplay (death sequences, boss kill).
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneRequest {
    ReloadLevel,
    MainMenu,
}

/// Per-frame gameplay order. Only runs while in game.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub enum GameplaySet {
    /// Probes and region diffs.
    Sense,
    /// Movement machines and enemy brains.
    Think,
    /// Attacks, projectiles, melee swings.
    Act,
    /// Damage, pickups, triggers.
    Resolve,
    /// Pending sequences, despawns, presentation.
    Cleanup,
}

#[derive(Component)]
pub struct GameplayRoot;

#[derive(Component)]
struct MainMenuUI;

#[derive(Component, Clone, Copy)]
enum MainBtn {
    Play,
    Quit,
}

pub struct GameFlowPlugin;

impl Plugin for GameFlowPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<GameState>()
            .add_event::<SceneRequest>()
            .configure_sets(
                Update,
                (
                    GameplaySet::Sense,
                    GameplaySet::Think,
                    GameplaySet::Act,
                    GameplaySet::Resolve,
                    GameplaySet::Cleanup,
                )
                    .chain()
                    .run_if(in_state(GameState::InGame)),
            )
            .add_systems(OnEnter(GameState::MainMenu), spawn_main_menu)
            .add_systems(OnExit(GameState::MainMenu), despawn_ui::<MainMenuUI>)
            .add_systems(
                Update,
                main_menu_buttons.run_if(in_state(GameState::MainMenu)),
            )
            .add_systems(OnExit(GameState::InGame), despawn_gameplay)
            .add_systems(OnEnter(GameState::Reloading), back_into_game)
            .add_systems(
                Update,
                handle_scene_requests.run_if(in_state(GameState::InGame)),
            );
    }
}

fn menu_root(commands: &mut Commands) -> Entity {
    commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            GlobalZIndex(1000),
            BackgroundColor(Color::NONE),
        ))
        .id()
}

fn menu_panel(commands: &mut Commands) -> Entity {
    commands
        .spawn((
            Node {
                width: Val::Px(420.0),
                flex_direction: FlexDirection::Column,
                row_gap: Val::Px(12.0),
                padding: UiRect::all(Val::Px(24.0)),
                align_items: AlignItems::Stretch,
                ..default()
            },
            BackgroundColor(Color::srgb(0.08, 0.05, 0.05)),
        ))
        .id()
}

fn menu_title(commands: &mut Commands, text: &str) -> Entity {
    commands
        .spawn((
            Text::new(text),
            TextFont {
                font_size: 44.0,
                ..default()
            },
            TextColor(Color::WHITE),
        ))
        .id()
}

fn spawn_button<A: Component>(commands: &mut Commands, label: &str, action: A) -> Entity {
    let btn = commands
        .spawn((
            Button,
            Node {
                height: Val::Px(48.0),
                align_items: AlignItems::Center,
                justify_content: JustifyContent::Center,
                ..default()
            },
            BackgroundColor(Color::srgb(0.25, 0.1, 0.1)),
            action,
        ))
        .id();

    let text = commands
        .spawn((
            Text::new(label),
            TextFont {
                font_size: 24.0,
                ..default()
            },
            TextColor(Color::WHITE),
        ))
        .id();

    commands.entity(btn).add_child(text);
    btn
}

fn spawn_main_menu(mut commands: Commands) {
    let root = menu_root(&mut commands);
    let panel = menu_panel(&mut commands);

    commands.entity(root).insert(MainMenuUI);
    commands.entity(root).add_child(panel);

    let title = menu_title(&mut commands, "HELLGATE");
    let b_play = spawn_button(&mut commands, "Play", MainBtn::Play);
    let b_quit = spawn_button(&mut commands, "Quit", MainBtn::Quit);

    commands.entity(panel).add_children(&[title, b_play, b_quit]);
}

fn set_btn_color(bg: &mut BackgroundColor, interaction: Interaction) {
    *bg = match interaction {
        Interaction::Pressed => Color::srgba(0.55, 0.2, 0.2, 1.0).into(),
        Interaction::Hovered => Color::srgba(0.4, 0.15, 0.15, 1.0).into(),
        Interaction::None => Color::srgba(0.25, 0.1, 0.1, 1.0).into(),
    };
}

fn main_menu_buttons(
    mut next: ResMut<NextState<GameState>>,
    mut exit: EventWriter<AppExit>,
    mut q: Query<(&Interaction, &mut BackgroundColor, &MainBtn), (Changed<Interaction>, With<Button>)>,
) {
    for (i, mut bg, btn) in &mut q {
        set_btn_color(&mut bg, *i);
        if *i == Interaction::Pressed {
            match btn {
                MainBtn::Play => next.set(GameState::InGame),
                MainBtn::Quit => {
                    let _ = exit.write(AppExit::Success);
                }
            }
        }
    }
}

fn handle_scene_requests(
    mut requests: EventReader<SceneRequest>,
    mut next: ResMut<NextState<GameState>>,
) {
    // MainMenu outranks ReloadLevel within a frame.
    let mut target = None;
    for req in requests.read() {
        if target == Some(GameState::MainMenu) {
            continue;
        }
        target = Some(match req {
            SceneRequest::MainMenu => GameState::MainMenu,
            SceneRequest::ReloadLevel => GameState::Reloading,
        });
    }
    if let Some(state) = target {
        info!("scene request -> {:?}", state);
        next.set(state);
    }
}

fn back_into_game(mut next: ResMut<NextState<GameState>>) {
    next.set(GameState::InGame);
}

fn despawn_ui<T: Component>(mut commands: Commands, q: Query<Entity, With<T>>) {
    for e in &q {
        commands.entity(e).despawn();
    }
}

pub fn despawn_gameplay(mut commands: Commands, q: Query<Entity, With<GameplayRoot>>) {
    for e in &q {
        commands.entity(e).try_despawn();
    }
}
