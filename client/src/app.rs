//! Root application component.

use leptos::prelude::*;
use leptos_meta::{Title, provide_meta_context};

use crate::pages::register::RegisterPage;

/// Root application component. The registration page is the whole app.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    view! {
        <Title text="Register map"/>
        <RegisterPage/>
    }
}
