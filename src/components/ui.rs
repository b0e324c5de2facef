//! Small styled primitives shared by the sidebar and the editor.

use icons::LoaderCircle;
use leptos::prelude::*;
use leptos_ui::{clx, variants};
use tw_merge::tw_merge;

variants! {
    Button {
        base: "inline-flex items-center justify-center gap-2 whitespace-nowrap rounded-md text-sm font-medium transition-colors disabled:pointer-events-none disabled:opacity-50 [&_svg]:pointer-events-none [&_svg:not([class*='size-'])]:size-4 shrink-0 outline-none focus-visible:ring-ring/50 focus-visible:ring-[3px] hover:cursor-pointer touch-manipulation select-none",
        variants: {
            variant: {
                Default: "bg-primary text-primary-foreground shadow-xs hover:bg-primary/90",
                Destructive: "bg-destructive text-white shadow-xs hover:bg-destructive/90",
                Ghost: "hover:bg-accent hover:text-accent-foreground",
                Accent: "bg-accent text-accent-foreground hover:bg-accent/80",
            },
            size: {
                Default: "h-9 px-4 py-2",
                Sm: "h-8 gap-1.5 px-3",
                Icon: "size-7",
            }
        },
        component: {
            element: button,
            support_href: true,
            support_aria_current: true
        }
    }
}

mod components {
    use super::*;
    clx! {Alert, div, "relative w-full rounded-md border border-destructive/40 px-3 py-2 text-xs text-destructive"}
    clx! {Panel, aside, "flex h-full min-h-0 flex-col border-r bg-muted/30"}
    clx! {PanelHeader, div, "flex items-center justify-between gap-2 px-3 py-2"}
}

pub use components::*;

#[component]
pub fn Spinner(#[prop(into, optional)] class: String) -> impl IntoView {
    let merged_class = tw_merge!("size-4 animate-spin", class);

    view! { <LoaderCircle class=merged_class attr:role="status" attr:aria-label="Loading" /> }
}

/// Row classes for one tree item. Drop highlight wins over selection.
/// `touch_locked` turns off browser panning while a gesture is pending.
pub fn tree_row_class(
    selected: bool,
    focused: bool,
    drop_target: bool,
    dragged: bool,
    touch_locked: bool,
) -> String {
    let state = if drop_target {
        "ring-2 ring-inset ring-primary bg-primary/10"
    } else if selected {
        "bg-accent text-accent-foreground"
    } else {
        "text-muted-foreground hover:bg-accent/50"
    };
    tw_merge!(
        "group flex min-w-0 cursor-pointer select-none items-center gap-1 rounded-md py-1 pr-2 text-sm transition-colors",
        state,
        if focused { "outline outline-2 -outline-offset-2 outline-ring" } else { "" },
        if dragged { "opacity-30" } else { "" },
        if touch_locked { "touch-none" } else { "" }
    )
}
