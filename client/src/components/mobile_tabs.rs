//! Tab strip of the narrow-screen layout.

use leptos::prelude::*;

#[cfg(feature = "hydrate")]
use crate::session::{SessionSlot, with_session};
use crate::state::ui::{MobileTab, RegisterUiState};

#[component]
pub fn MobileTabs() -> impl IntoView {
    let ui = expect_context::<RwSignal<RegisterUiState>>();
    #[cfg(feature = "hydrate")]
    let slot = expect_context::<SessionSlot>();

    let tabs = MobileTab::ALL
        .into_iter()
        .map(|tab| {
            let selected = move || ui.with(|u| u.tab == tab);
            let on_click = {
                #[cfg(feature = "hydrate")]
                {
                    move |_ev: leptos::ev::MouseEvent| {
                        with_session(slot, |session| session.show_tab(tab));
                    }
                }
                #[cfg(not(feature = "hydrate"))]
                {
                    move |_ev: leptos::ev::MouseEvent| ui.update(|u| u.tab = tab)
                }
            };
            view! {
                <button
                    type="button"
                    role="tab"
                    class="mobile-tabs__tab"
                    class:mobile-tabs__tab--active=selected
                    aria-selected=move || if selected() { "true" } else { "false" }
                    data-tab=tab.key()
                    on:click=on_click
                >
                    {tab.label()}
                </button>
            }
        })
        .collect_view();

    view! {
        <nav class="mobile-tabs" role="tablist" class:mobile-tabs--hidden=move || !ui.with(|u| u.mobile)>
            {tabs}
        </nav>
    }
}
