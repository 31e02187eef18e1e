use crate::combat::WeaponSlot;
use crate::gameflow::GameState;
use crate::health::{Health, Mana};
use crate::player::Player;
use crate::prelude::*;
use bevy::ui::GlobalZIndex;

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(GameState::InGame), spawn_hud)
            .add_systems(OnExit(GameState::InGame), despawn_hud)
            .add_systems(
                Update,
                (
                    update_health_bar,
                    update_mana_bar,
                    update_health_text,
                    update_mana_text,
                    update_weapon_text,
                )
                    .run_if(in_state(GameState::InGame)),
            );
    }
}

#[derive(Component)]
struct HudRoot;

#[derive(Component, Default)] struct HealthFill;
#[derive(Component, Default)] struct ManaFill;
#[derive(Component, Default)] struct HealthText;
#[derive(Component, Default)] struct ManaText;
#[derive(Component, Default)] struct WeaponText;

fn bar_row(
    commands: &mut Commands,
    label: &str,
    height: f32,
    color: Color,
    fill: impl Component,
    text: impl Component,
) -> Entity {
    let row = commands.spawn((
        Node {
            flex_direction: FlexDirection::Row,
            align_items: AlignItems::Center,
            column_gap: Val::Px(8.0),
            ..default()
        },
        BackgroundColor(Color::NONE),
    )).id();

    let label = commands.spawn((
        Text::new(label),
        TextFont { font_size: 14.0, ..default() },
        TextColor(Color::WHITE),
    )).id();

    let container = commands.spawn((
        Node {
            width: Val::Px(220.0),
            height: Val::Px(height),
            border: UiRect::all(Val::Px(2.0)),
            ..default()
        },
        BorderColor(Color::srgb(0.1, 0.1, 0.1)),
        BackgroundColor(Color::srgb(0.05, 0.05, 0.05)),
    )).id();

    let fill = commands.spawn((
        Node { width: Val::Percent(100.0), height: Val::Percent(100.0), ..default() },
        BackgroundColor(color),
        fill,
    )).id();

    let overlay = commands.spawn((
        Node {
            position_type: PositionType::Absolute,
            left: Val::Px(0.0),
            right: Val::Px(0.0),
            top: Val::Px(0.0),
            bottom: Val::Px(0.0),
            justify_content: JustifyContent::Center,
            align_items: AlignItems::Center,
            ..default()
        },
        BackgroundColor(Color::NONE),
    )).id();

    let value = commands.spawn((
        Text::new("100/100"),
        TextFont { font_size: 11.0, ..default() },
        TextColor(Color::WHITE),
        text,
    )).id();

    commands.entity(overlay).add_child(value);
    commands.entity(container).add_children(&[fill, overlay]);
    commands.entity(row).add_children(&[label, container]);
    row
}

fn spawn_hud(mut commands: Commands) {
    let root = commands.spawn((
        HudRoot,
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            left: Val::Px(12.0),
            flex_direction: FlexDirection::Column,
            row_gap: Val::Px(6.0),
            ..default()
        },
        GlobalZIndex(1),
        BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.0)),
    )).id();

    let hp = bar_row(&mut commands, "HP", 18.0, Color::srgb(0.85, 0.2, 0.2), HealthFill, HealthText);
    let mp = bar_row(&mut commands, "MP", 12.0, Color::srgb(0.2, 0.4, 0.9), ManaFill, ManaText);

    let weapon = commands.spawn((
        Text::new(""),
        TextFont { font_size: 12.0, ..default() },
        TextColor(Color::srgb(0.8, 0.8, 0.8)),
        WeaponText,
    )).id();

    commands.entity(root).add_children(&[hp, mp, weapon]);
}

fn update_health_bar(player: Query<&Health, With<Player>>, mut q: Query<&mut Node, With<HealthFill>>) {
    if let (Ok(health), Ok(mut node)) = (player.single(), q.single_mut()) {
        node.width = Val::Percent(health.fraction() * 100.0);
    }
}

fn update_mana_bar(player: Query<&Mana, With<Player>>, mut q: Query<&mut Node, With<ManaFill>>) {
    if let (Ok(mana), Ok(mut node)) = (player.single(), q.single_mut()) {
        node.width = Val::Percent(mana.fraction() * 100.0);
    }
}

fn update_health_text(player: Query<&Health, With<Player>>, mut q: Query<&mut Text, With<HealthText>>) {
    if let (Ok(health), Ok(mut text)) = (player.single(), q.single_mut()) {
        *text = Text::new(format!("{:.0}/{:.0}", health.current(), health.max()));
    }
}

fn update_mana_text(player: Query<&Mana, With<Player>>, mut q: Query<&mut Text, With<ManaText>>) {
    if let (Ok(mana), Ok(mut text)) = (player.single(), q.single_mut()) {
        *text = Text::new(format!("{:.0}/{:.0}", mana.current(), mana.max()));
    }
}

fn update_weapon_text(
    player: Query<&WeaponSlot, (With<Player>, Changed<WeaponSlot>)>,
    mut q: Query<&mut Text, With<WeaponText>>,
) {
    if let (Ok(slot), Ok(mut text)) = (player.single(), q.single_mut()) {
        let name = slot.equipped().map(|w| w.name.as_str()).unwrap_or("unarmed");
        *text = Text::new(name);
    }
}

fn despawn_hud(mut commands: Commands, q: Query<Entity, With<HudRoot>>) {
    for e in &q {
        commands.entity(e).despawn();
    }
}
