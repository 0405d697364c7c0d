mod api;
mod audio;
mod geolocation;
pub mod map_view;
pub mod session;

use std::collections::BTreeSet;

use seed::{prelude::*, virtual_dom::AtValue, *};
use shared::{ChatTurn, Coordinates, Role, TravelMode, TravelQueryResponse, TurnId};
use wasm_bindgen::prelude::wasm_bindgen;

use crate::map_view::MapRenderer;
use crate::session::{LocationStatus, QueryTicket, Session};

const INPUT_PLACEHOLDER: &str = "Ej: ¿Cuánto tardo en llegar a la cafetería más cercana?";

pub struct Model {
    session: Session,
    input: String,
    speaking: BTreeSet<TurnId>,
    map: MapRenderer,
    chat_end: ElRef<web_sys::HtmlElement>,
}

pub enum Msg {
    LocationResolved(Result<Coordinates, String>),
    InputChanged(String),
    Submit,
    TravelFetched(QueryTicket, Result<TravelQueryResponse, String>),
    Speak(TurnId),
    SpeechFinished(TurnId, Result<(), String>),
    ScrollToEnd,
}

pub fn init(_: Url, orders: &mut impl Orders<Msg>) -> Model {
    orders.perform_cmd(async { Msg::LocationResolved(geolocation::current_position().await) });

    Model {
        session: Session::new(),
        input: String::new(),
        speaking: BTreeSet::new(),
        map: MapRenderer::default(),
        chat_end: ElRef::default(),
    }
}

pub fn update(msg: Msg, model: &mut Model, orders: &mut impl Orders<Msg>) {
    match msg {
        Msg::LocationResolved(result) => {
            if let Err(err) = &result {
                web_sys::console::error_1(&format!("[frontend] {err}").into());
            }
            model.session.location_resolved(result);
            sync_map(model);
            scroll_to_end(orders);
        }
        Msg::InputChanged(val) => model.input = val,
        Msg::Submit => match model.session.begin_query(&model.input) {
            Ok((ticket, payload)) => {
                model.input.clear();
                orders.perform_cmd(async move {
                    Msg::TravelFetched(ticket, api::fetch_travel_info(payload).await)
                });
                sync_map(model);
                scroll_to_end(orders);
            }
            Err(rejected) => {
                web_sys::console::debug_1(&format!("[frontend] send rejected: {rejected:?}").into());
            }
        },
        Msg::TravelFetched(ticket, result) => {
            if model.session.finish_query(ticket, result) {
                sync_map(model);
                scroll_to_end(orders);
            } else {
                web_sys::console::debug_1(&"[frontend] dropped stale travel response".into());
            }
        }
        Msg::Speak(id) => {
            let Some(turn) = model.session.turn(id) else {
                return;
            };
            if !model.speaking.insert(id) {
                return;
            }
            let text = turn.text.clone();
            orders.perform_cmd(async move {
                let result = match api::fetch_speech(text).await {
                    Ok(clip) => audio::play(&clip).await,
                    Err(err) => Err(err),
                };
                Msg::SpeechFinished(id, result)
            });
        }
        Msg::SpeechFinished(id, result) => {
            model.speaking.remove(&id);
            if let Err(err) = result {
                web_sys::console::error_1(&format!("[frontend] TTS failed: {err}").into());
            }
        }
        Msg::ScrollToEnd => {
            if let Some(end) = model.chat_end.get() {
                let options = web_sys::ScrollIntoViewOptions::new();
                options.set_behavior(web_sys::ScrollBehavior::Smooth);
                end.scroll_into_view_with_scroll_into_view_options(&options);
            }
        }
    }
}

fn sync_map(model: &mut Model) {
    if let Some(user) = model.session.user_location() {
        model.map.sync(user, model.session.map());
    }
}

fn scroll_to_end(orders: &mut impl Orders<Msg>) {
    orders.after_next_render(|_| Msg::ScrollToEnd);
}

pub fn view(model: &Model) -> Node<Msg> {
    div![
        C!["app-container"],
        view_map_overlay(model),
        section![
            C!["chat-pane"],
            header![h1!["Asistente de Viaje IA"]],
            main![C!["transcript"], view_transcript(model)],
            footer![view_input(model)],
        ]
    ]
}

fn view_map_overlay(model: &Model) -> Node<Msg> {
    if model.session.user_location().is_none() {
        return div![
            C!["map-placeholder"],
            p!["Esperando la ubicación para mostrar el mapa..."]
        ];
    }

    let entries = TravelMode::LEGEND.iter().map(|mode| {
        li![
            span![C!["legend-swatch"], style! {St::BackgroundColor => mode.color()}],
            mode.legend_label(),
        ]
    });
    div![C!["map-legend"], h3!["Leyenda"], ul![entries]]
}

fn view_transcript(model: &Model) -> Vec<Node<Msg>> {
    match model.session.location() {
        LocationStatus::Pending => vec![div![
            C!["status"],
            div![C!["spinner"]],
            p![C!["status-title"], "Obteniendo tu ubicación..."],
            p!["Por favor, permite el acceso a la ubicación para continuar."],
        ]],
        LocationStatus::Failed(message) => vec![div![
            C!["status", "error"],
            h2!["Error de Ubicación"],
            p![message.as_str()],
            p![
                C!["hint"],
                "Por favor, activa los servicios de ubicación en tu navegador y actualiza la página."
            ],
        ]],
        LocationStatus::Ready(_) => {
            let mut nodes: Vec<Node<Msg>> = model
                .session
                .turns()
                .iter()
                .map(|turn| view_turn(turn, model.speaking.contains(&turn.id)))
                .collect();
            if model.session.is_loading() {
                nodes.push(div![
                    C!["message", "assistant", "typing"],
                    div![C!["avatar"], "IA"],
                    div![C!["bubble"], span![C!["dot"]], span![C!["dot"]], span![C!["dot"]]],
                ]);
            }
            if let Some(error) = model.session.error() {
                nodes.push(p![C!["error"], error]);
            }
            nodes.push(div![el_ref(&model.chat_end), C!["chat-end"]]);
            nodes
        }
    }
}

fn view_turn(turn: &ChatTurn, speaking: bool) -> Node<Msg> {
    let is_user = turn.role == Role::User;
    let id = turn.id;

    let links: Vec<Node<Msg>> = turn
        .sources
        .iter()
        .filter_map(|source| source.maps_link())
        .map(|(uri, title)| {
            li![a![
                attrs! {
                    At::Href => uri,
                    At::Target => "_blank",
                    At::Rel => "noopener noreferrer",
                },
                title
            ]]
        })
        .collect();
    let sources = if links.is_empty() {
        empty![]
    } else {
        div![C!["sources"], h4!["Fuentes:"], ul![links]]
    };

    let speak = if is_user {
        empty![]
    } else {
        button![
            C!["speak"],
            attrs! {
                At::from("aria-label") => "Leer mensaje en voz alta",
                At::Disabled => bool_attr(speaking),
            },
            if speaking {
                span![C!["spinner", "small"]]
            } else {
                span![C!["speaker-icon"], "🔊"]
            },
            ev(Ev::Click, move |_| Msg::Speak(id)),
        ]
    };

    div![
        C!["message", if is_user { "user" } else { "assistant" }],
        div![C!["avatar"], if is_user { "U" } else { "IA" }],
        div![
            C!["body"],
            div![C!["bubble"], view_text(&turn.text), sources],
            speak
        ],
    ]
}

/// Renders text with its line breaks preserved.
fn view_text(text: &str) -> Node<Msg> {
    let mut nodes = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if idx > 0 {
            nodes.push(br![]);
        }
        nodes.push(plain![line.to_string()]);
    }
    div![C!["text"], nodes]
}

fn view_input(model: &Model) -> Node<Msg> {
    let disabled = !model.session.can_send();
    let blank = model.input.trim().is_empty();

    div![
        C!["chat-input"],
        textarea![
            attrs! {
                At::Value => model.input.as_str(),
                At::Placeholder => INPUT_PLACEHOLDER,
                At::Rows => "1",
                At::Disabled => bool_attr(disabled),
            },
            input_ev(Ev::Input, Msg::InputChanged),
            keyboard_ev(Ev::KeyDown, |event| {
                if event.key() == "Enter" && !event.shift_key() {
                    event.prevent_default();
                    Some(Msg::Submit)
                } else {
                    None
                }
            }),
        ],
        button![
            C!["send"],
            "➤",
            attrs! {
                At::from("aria-label") => "Enviar mensaje",
                At::Disabled => bool_attr(disabled || blank),
            },
            ev(Ev::Click, |event| {
                event.prevent_default();
                Msg::Submit
            }),
        ]
    ]
}

fn bool_attr(value: bool) -> AtValue {
    if value {
        AtValue::Some("true".into())
    } else {
        AtValue::Ignored
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    App::start("app", init, update, view);
}
