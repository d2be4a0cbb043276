use std::rc::Rc;

use leptos::ev;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::window_event_listener;

use crate::auth::{authenticate, format_cnpj};
use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, ButtonVariant, Card, CardContent,
    CardDescription, CardHeader, CardTitle, Checkbox, Input, Label, Spinner, Textarea,
};
use crate::models::{Address, Cart, Customer, CustomerDraft, Draft, Order, Product, ProductDraft};
use crate::state::panel::{panel_state, PaneFocus, PANEL_BREAKPOINT_PX};
use crate::state::view::{View, ViewController, ViewSink};
use crate::state::AppContext;
use crate::store::gateway::IdPolicy;
use crate::util::{format_brl, format_timestamp, parse_i64_or_zero};

#[component]
pub fn LoginPage() -> impl IntoView {
    let cnpj: RwSignal<String> = RwSignal::new(String::new());
    let owner_id: RwSignal<String> = RwSignal::new(String::new());
    let message: RwSignal<Option<String>> = RwSignal::new(None);
    let checking: RwSignal<bool> = RwSignal::new(false);

    let app_state = expect_context::<AppContext>();

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let cnpj_val = cnpj.get();
        let owner_val = owner_id.get();
        let store = app_state.gateway().store();
        let session = app_state.session();
        let company_signal = app_state.company();

        checking.set(true);
        message.set(None);

        spawn_local(async move {
            match authenticate(&store, &cnpj_val, &owner_val).await {
                Ok(company) => {
                    session.save(&company, None);
                    company_signal.set(Some(company));
                }
                Err(err) => {
                    message.set(Some(err.to_string()));
                }
            }
            checking.set(false);
        });
    };

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto flex min-h-screen w-full max-w-sm flex-col justify-center px-4 py-10">
                <div class="mb-6 flex items-center justify-center">
                    <span class="text-sm font-medium text-foreground">"Balcão"</span>
                </div>

                <Card>
                    <CardHeader>
                        <CardTitle class="text-lg">"Sign in"</CardTitle>
                        <CardDescription class="text-xs">
                            "Use your company's CNPJ and owner id to continue."
                        </CardDescription>
                    </CardHeader>

                    <CardContent>
                        <form class="flex flex-col gap-3" on:submit=on_submit>
                            <div class="flex flex-col gap-1.5">
                                <Label html_for="cnpj" class="text-xs">"CNPJ"</Label>
                                <Input
                                    id="cnpj"
                                    placeholder="12.345.678/0001-99"
                                    bind_value=cnpj
                                    required=true
                                    class="h-8 text-sm"
                                />
                            </div>

                            <div class="flex flex-col gap-1.5">
                                <Label html_for="ownerId" class="text-xs">"Owner id"</Label>
                                <Input
                                    id="ownerId"
                                    placeholder="owner"
                                    bind_value=owner_id
                                    required=true
                                    class="h-8 text-sm"
                                />
                            </div>

                            <Show when=move || message.get().is_some() fallback=|| ().into_view()>
                                {move || {
                                    message.get().map(|m| view! {
                                        <Alert class="border-destructive/30">
                                            <AlertDescription class="text-destructive text-xs">{m}</AlertDescription>
                                        </Alert>
                                    })
                                }}
                            </Show>

                            <Button
                                class="w-full"
                                size=ButtonSize::Sm
                                attr:disabled=move || checking.get()
                            >
                                <span class="inline-flex items-center gap-2">
                                    <Show when=move || checking.get() fallback=|| ().into_view()>
                                        <Spinner />
                                    </Show>
                                    {move || if checking.get() { "Checking..." } else { "Continue" }}
                                </span>
                            </Button>
                        </form>
                    </CardContent>
                </Card>
            </div>
        </div>
    }
}

#[component]
pub fn RootPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let company = app_state.company();
    let authed = move || company.get().is_some();

    view! {
        <Show when=authed fallback=move || view! { <LoginPage /> }>
            <ConsolePage />
        </Show>
    }
}

/// Signals shared by the console's views. Provided as context below
/// `ConsolePage`; the controller lives in a local stored value because it
/// is not `Send`.
#[derive(Clone)]
struct ConsoleUi {
    current_view: RwSignal<View>,
    loading: RwSignal<bool>,
    load_error: RwSignal<Option<String>>,
    customers: RwSignal<Vec<Customer>>,
    products: RwSignal<Vec<Product>>,
    orders: RwSignal<Vec<Order>>,
    carts: RwSignal<Vec<Cart>>,
    viewport_width: RwSignal<f64>,
    pane_focus: RwSignal<PaneFocus>,
    expanded_customer: RwSignal<Option<String>>,
    controller: StoredValue<ViewController, LocalStorage>,
}

/// ViewSink over the console signals. Snapshots only touch the list
/// signals, so a form mid-edit is never repainted by a live update.
struct SignalSink {
    current_view: RwSignal<View>,
    loading: RwSignal<bool>,
    load_error: RwSignal<Option<String>>,
    customers: RwSignal<Vec<Customer>>,
    products: RwSignal<Vec<Product>>,
    orders: RwSignal<Vec<Order>>,
    carts: RwSignal<Vec<Cart>>,
    pane_focus: RwSignal<PaneFocus>,
    expanded_customer: RwSignal<Option<String>>,
}

impl ViewSink for SignalSink {
    fn view_changed(&self, view: View) {
        self.current_view.set(view);
        self.loading.set(true);
        self.load_error.set(None);
        self.expanded_customer.set(None);
        self.pane_focus.set(PaneFocus::Neither);
    }

    fn customers(&self, rows: Vec<Customer>) {
        self.customers.set(rows);
        self.loading.set(false);
    }

    fn products(&self, rows: Vec<Product>) {
        self.products.set(rows);
        self.loading.set(false);
    }

    fn orders(&self, rows: Vec<Order>) {
        self.orders.set(rows);
        self.loading.set(false);
    }

    fn carts(&self, rows: Vec<Cart>) {
        self.carts.set(rows);
        self.loading.set(false);
    }

    fn load_failed(&self, _view: View, message: String) {
        self.loading.set(false);
        self.load_error.set(Some(message));
    }
}

fn current_viewport_width() -> f64 {
    web_sys::window()
        .and_then(|w| w.inner_width().ok())
        .and_then(|v| v.as_f64())
        .unwrap_or(PANEL_BREAKPOINT_PX)
}

#[component]
pub fn ConsolePage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let company_signal = app_state.company();

    let Some(company) = company_signal.get_untracked() else {
        // RootPage gates on the session; this branch only covers races
        // around logout.
        return view! { <LoginPage /> }.into_any();
    };

    let current_view = RwSignal::new(View::Customers);
    let loading = RwSignal::new(true);
    let load_error: RwSignal<Option<String>> = RwSignal::new(None);
    let customers: RwSignal<Vec<Customer>> = RwSignal::new(vec![]);
    let products: RwSignal<Vec<Product>> = RwSignal::new(vec![]);
    let orders: RwSignal<Vec<Order>> = RwSignal::new(vec![]);
    let carts: RwSignal<Vec<Cart>> = RwSignal::new(vec![]);
    let viewport_width = RwSignal::new(current_viewport_width());
    let pane_focus = RwSignal::new(PaneFocus::Neither);
    let expanded_customer: RwSignal<Option<String>> = RwSignal::new(None);

    let sink = SignalSink {
        current_view,
        loading,
        load_error,
        customers,
        products,
        orders,
        carts,
        pane_focus,
        expanded_customer,
    };

    let controller = StoredValue::new_local(ViewController::new(
        app_state.gateway(),
        &company.id,
        Rc::new(sink),
        Rc::new(|fut| spawn_local(fut)),
    ));

    provide_context(ConsoleUi {
        current_view,
        loading,
        load_error,
        customers,
        products,
        orders,
        carts,
        viewport_width,
        pane_focus,
        expanded_customer,
        controller,
    });

    // Initial view on entering the authenticated shell.
    Effect::new(move |_| {
        controller.with_value(|c| c.select_view(View::Customers));
    });

    // Viewport width feeds the panel layout; the listener is detached when
    // this component is cleaned up.
    let _resize_handle = window_event_listener(ev::resize, move |_| {
        viewport_width.set(current_viewport_width());
    });

    on_cleanup(move || {
        controller.try_with_value(|c| c.shutdown());
    });

    let on_logout = move |_| {
        controller.with_value(|c| c.shutdown());
        app_state.session().clear();
        company_signal.set(None);
    };

    let company_name = if company.name.trim().is_empty() {
        "—".to_string()
    } else {
        company.name.clone()
    };
    let company_cnpj = format_cnpj(&company.cnpj);
    let status_line = format!("Connected as {}", company.owner_id);

    view! {
        <div class="min-h-screen bg-background">
            <header class="border-b">
                <div class="mx-auto flex w-full max-w-[1200px] items-center justify-between px-4 py-3">
                    <div class="space-y-0.5">
                        <div class="text-sm font-semibold">{company_name}</div>
                        <div class="text-xs text-muted-foreground">{company_cnpj}</div>
                    </div>

                    <div class="flex items-center gap-3">
                        <div class="hidden text-xs text-muted-foreground sm:block">{status_line}</div>
                        <Button variant=ButtonVariant::Outline size=ButtonSize::Sm on:click=on_logout>
                            "Sign out"
                        </Button>
                    </div>
                </div>
            </header>

            <div class="mx-auto flex w-full max-w-[1200px] gap-4 px-4 py-4">
                <nav class="flex w-40 shrink-0 flex-col gap-1">
                    {View::ALL
                        .into_iter()
                        .map(|v| {
                            view! {
                                <button
                                    class=move || {
                                        if current_view.get() == v {
                                            "rounded-md bg-accent px-3 py-2 text-left text-sm font-medium text-accent-foreground"
                                        } else {
                                            "rounded-md px-3 py-2 text-left text-sm text-muted-foreground hover:bg-accent/50 hover:text-foreground"
                                        }
                                    }
                                    on:click=move |_| controller.with_value(|c| c.select_view(v))
                                >
                                    {v.title()}
                                </button>
                            }
                        })
                        .collect_view()}
                </nav>

                <main class="min-w-0 flex-1">
                    <h1 class="mb-3 text-lg font-semibold">{move || current_view.get().title()}</h1>

                    {move || match current_view.get() {
                        View::Customers => view! { <CustomersView /> }.into_any(),
                        View::Products => view! { <ProductsView /> }.into_any(),
                        View::Orders => view! { <OrdersView /> }.into_any(),
                        View::Carts => view! { <CartsView /> }.into_any(),
                    }}
                </main>
            </div>
        </div>
    }
    .into_any()
}

#[component]
fn CustomersView() -> impl IntoView {
    let ui = expect_context::<ConsoleUi>();
    let editing: RwSignal<Option<Customer>> = RwSignal::new(None);

    let viewport_width = ui.viewport_width;
    let pane_focus = ui.pane_focus;
    let panel = move || panel_state(viewport_width.get(), pane_focus.get());

    view! {
        <div class=move || panel().container_class()>
            <section class=move || panel().list_class()>
                <CustomerList editing=editing />
            </section>

            <section
                class=move || panel().form_class()
                on:focusin=move |_| pane_focus.set(PaneFocus::Form)
                on:focusout=move |_| pane_focus.set(PaneFocus::Neither)
            >
                <CustomerForm editing=editing />
            </section>
        </div>
    }
}

#[component]
fn CustomerList(editing: RwSignal<Option<Customer>>) -> impl IntoView {
    let ui = expect_context::<ConsoleUi>();
    let customers = ui.customers;
    let loading = ui.loading;
    let load_error = ui.load_error;
    let expanded = ui.expanded_customer;
    let pane_focus = ui.pane_focus;

    view! {
        <Card>
            <CardHeader>
                <CardTitle class="text-base">"Customers"</CardTitle>
                <CardDescription class="text-xs">
                    {move || format!("{} total", customers.get().len())}
                </CardDescription>
            </CardHeader>

            <CardContent class="flex flex-col gap-2">
                <Show when=move || load_error.get().is_some() fallback=|| ().into_view()>
                    {move || load_error.get().map(|e| view! {
                        <Alert class="border-destructive/30">
                            <AlertDescription class="text-destructive text-xs">{e}</AlertDescription>
                        </Alert>
                    })}
                </Show>

                <Show when=move || loading.get() fallback=|| ().into_view()>
                    <div class="text-xs text-muted-foreground">"Loading..."</div>
                </Show>

                <Show
                    when=move || !loading.get() && customers.get().is_empty()
                    fallback=|| ().into_view()
                >
                    <div class="text-sm text-muted-foreground">"No customers yet."</div>
                </Show>

                {move || {
                    customers
                        .get()
                        .into_iter()
                        .map(|c| {
                            let row_id = c.id.clone();
                            let name = display_or_dash(&c.name);
                            let subtitle = format!(
                                "{} • {}",
                                display_or_dash(&c.phone),
                                display_or_dash(&c.cpf)
                            );
                            let cpf = display_or_dash(&c.cpf);
                            let default_addr = c.default_address.summary();
                            let alternate_addr = c.alternate_address.summary();
                            let shipping_addr = c.shipping_address.summary();
                            let billing_addr = c.billing_address.summary();
                            let created = format_timestamp(c.created_at);

                            let is_open = {
                                let row_id = row_id.clone();
                                move || expanded.get().as_deref() == Some(row_id.as_str())
                            };

                            // Opening a row closes whichever other row was
                            // open and biases the layout toward the list.
                            let toggle = {
                                let row_id = row_id.clone();
                                move |_| {
                                    let already_open =
                                        expanded.get_untracked().as_deref() == Some(row_id.as_str());
                                    if already_open {
                                        expanded.set(None);
                                        pane_focus.set(PaneFocus::Neither);
                                    } else {
                                        expanded.set(Some(row_id.clone()));
                                        pane_focus.set(PaneFocus::List);
                                    }
                                }
                            };

                            let row = c.clone();
                            view! {
                                <div class="rounded-md border px-3 py-2">
                                    <div
                                        class="flex cursor-pointer items-center justify-between gap-2"
                                        on:click=toggle
                                    >
                                        <div class="min-w-0">
                                            <div class="truncate text-sm font-medium">{name}</div>
                                            <div class="truncate text-xs text-muted-foreground">{subtitle}</div>
                                        </div>
                                        <Button
                                            variant=ButtonVariant::Outline
                                            size=ButtonSize::Sm
                                            on:click=move |ev: web_sys::MouseEvent| {
                                                ev.stop_propagation();
                                                editing.set(Some(row.clone()));
                                            }
                                        >
                                            "Edit"
                                        </Button>
                                    </div>

                                    <Show when=is_open fallback=|| ().into_view()>
                                        <div class="mt-2 space-y-1 border-t pt-2 text-xs">
                                            <div><span class="font-medium">"CPF: "</span>{cpf.clone()}</div>
                                            <div><span class="font-medium">"Default address: "</span>{default_addr.clone()}</div>
                                            <div><span class="font-medium">"Alternate address: "</span>{alternate_addr.clone()}</div>
                                            <div><span class="font-medium">"Shipping address: "</span>{shipping_addr.clone()}</div>
                                            <div><span class="font-medium">"Billing address: "</span>{billing_addr.clone()}</div>
                                            <div><span class="font-medium">"Created: "</span>{created.clone()}</div>
                                        </div>
                                    </Show>
                                </div>
                            }
                            .into_any()
                        })
                        .collect_view()
                }}
            </CardContent>
        </Card>
    }
}

/// Text-signal cluster for one address fieldset. The `number` field stays
/// free text until submit, where it coerces to an integer (0 on malformed
/// input).
#[derive(Clone, Copy)]
struct AddressSignals {
    street: RwSignal<String>,
    number: RwSignal<String>,
    neighborhood: RwSignal<String>,
    city: RwSignal<String>,
    state: RwSignal<String>,
    zip: RwSignal<String>,
}

impl AddressSignals {
    fn new() -> Self {
        Self {
            street: RwSignal::new(String::new()),
            number: RwSignal::new(String::new()),
            neighborhood: RwSignal::new(String::new()),
            city: RwSignal::new(String::new()),
            state: RwSignal::new(String::new()),
            zip: RwSignal::new(String::new()),
        }
    }

    fn to_address(&self) -> Address {
        Address {
            street: self.street.get_untracked(),
            number: parse_i64_or_zero(&self.number.get_untracked()).max(0),
            neighborhood: self.neighborhood.get_untracked(),
            city: self.city.get_untracked(),
            state: self.state.get_untracked(),
            zip: self.zip.get_untracked(),
        }
    }

    fn set_from(&self, addr: &Address) {
        self.street.set(addr.street.clone());
        self.number.set(if addr.number == 0 {
            String::new()
        } else {
            addr.number.to_string()
        });
        self.neighborhood.set(addr.neighborhood.clone());
        self.city.set(addr.city.clone());
        self.state.set(addr.state.clone());
        self.zip.set(addr.zip.clone());
    }

    fn clear(&self) {
        self.set_from(&Address::default());
    }
}

#[component]
fn AddressGroup(
    label: &'static str,
    signals: AddressSignals,
    open: RwSignal<bool>,
) -> impl IntoView {
    view! {
        <fieldset class="rounded-md border px-3 py-2">
            <legend
                class="cursor-pointer select-none px-1 text-xs font-medium"
                aria-expanded=move || open.get().to_string()
                on:click=move |_| open.update(|o| *o = !*o)
            >
                {label}
            </legend>

            <Show when=move || open.get() fallback=|| ().into_view()>
                <div class="grid gap-2 sm:grid-cols-2">
                    <div class="flex flex-col gap-1">
                        <Label class="text-xs">"Street"</Label>
                        <Input bind_value=signals.street class="h-8 text-sm" />
                    </div>
                    <div class="flex flex-col gap-1">
                        <Label class="text-xs">"Number"</Label>
                        <Input r#type="number" bind_value=signals.number class="h-8 text-sm" />
                    </div>
                    <div class="flex flex-col gap-1">
                        <Label class="text-xs">"Neighborhood"</Label>
                        <Input bind_value=signals.neighborhood class="h-8 text-sm" />
                    </div>
                    <div class="flex flex-col gap-1">
                        <Label class="text-xs">"City"</Label>
                        <Input bind_value=signals.city class="h-8 text-sm" />
                    </div>
                    <div class="flex flex-col gap-1">
                        <Label class="text-xs">"State"</Label>
                        <Input bind_value=signals.state class="h-8 text-sm" />
                    </div>
                    <div class="flex flex-col gap-1">
                        <Label class="text-xs">"ZIP"</Label>
                        <Input bind_value=signals.zip class="h-8 text-sm" />
                    </div>
                </div>
            </Show>
        </fieldset>
    }
}

#[component]
fn CustomerForm(editing: RwSignal<Option<Customer>>) -> impl IntoView {
    let ui = expect_context::<ConsoleUi>();
    let app_state = expect_context::<AppContext>();
    let controller = ui.controller;

    let name = RwSignal::new(String::new());
    let phone = RwSignal::new(String::new());
    let cpf = RwSignal::new(String::new());

    let default_addr = AddressSignals::new();
    let alternate_addr = AddressSignals::new();
    let shipping_addr = AddressSignals::new();
    let billing_addr = AddressSignals::new();

    // Only the first address group starts expanded.
    let open_default = RwSignal::new(true);
    let open_alternate = RwSignal::new(false);
    let open_shipping = RwSignal::new(false);
    let open_billing = RwSignal::new(false);

    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let saving = RwSignal::new(false);
    let confirm_delete = RwSignal::new(false);

    let clear_form = move || {
        name.set(String::new());
        phone.set(String::new());
        cpf.set(String::new());
        default_addr.clear();
        alternate_addr.clear();
        shipping_addr.clear();
        billing_addr.clear();
        error.set(None);
    };

    // Entering edit mode prefills every field (all four address slots);
    // leaving it returns the form to blank mode.
    Effect::new(move |_| match editing.get() {
        Some(c) => {
            name.set(c.name.clone());
            phone.set(c.phone.clone());
            cpf.set(c.cpf.clone());
            default_addr.set_from(&c.default_address);
            alternate_addr.set_from(&c.alternate_address);
            shipping_addr.set_from(&c.shipping_address);
            billing_addr.set_from(&c.billing_address);
            error.set(None);
        }
        None => clear_form(),
    });

    let draft_from_form = move || {
        Draft::Customer(CustomerDraft {
            name: name.get_untracked(),
            phone: phone.get_untracked(),
            cpf: cpf.get_untracked(),
            default_address: default_addr.to_address(),
            alternate_address: alternate_addr.to_address(),
            shipping_address: shipping_addr.to_address(),
            billing_address: billing_addr.to_address(),
        })
    };

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if saving.get_untracked() {
            return;
        }

        let draft = draft_from_form();
        let gateway = app_state.gateway();
        let path = controller.with_value(|c| c.collection_path(View::Customers));
        let current = editing.get_untracked();

        saving.set(true);
        error.set(None);

        spawn_local(async move {
            let outcome = match &current {
                Some(c) => gateway.update(&path, &c.id, &draft).await,
                None => gateway
                    .create(&path, &draft, IdPolicy::TimestampTagged)
                    .await
                    .map(|_| ()),
            };

            match outcome {
                Ok(()) => {
                    if current.is_some() {
                        editing.set(None);
                    } else {
                        clear_form();
                    }
                }
                Err(err) => {
                    // The user's input stays in place.
                    error.set(Some(err.to_string()));
                }
            }
            saving.set(false);
        });
    };

    let on_delete_confirmed = move |_| {
        let Some(current) = editing.get_untracked() else {
            return;
        };
        let gateway = app_state.gateway();
        let path = controller.with_value(|c| c.collection_path(View::Customers));

        saving.set(true);
        error.set(None);

        spawn_local(async move {
            match gateway.delete(&path, &current.id).await {
                Ok(()) => {
                    confirm_delete.set(false);
                    editing.set(None);
                }
                Err(err) => {
                    confirm_delete.set(false);
                    error.set(Some(err.to_string()));
                }
            }
            saving.set(false);
        });
    };

    view! {
        <Card>
            <CardHeader>
                <CardTitle class="text-base">
                    {move || if editing.get().is_some() { "Edit customer" } else { "New customer" }}
                </CardTitle>
            </CardHeader>

            <CardContent>
                <form class="flex flex-col gap-3" on:submit=on_submit>
                    <div class="flex flex-col gap-1.5">
                        <Label html_for="customerName" class="text-xs">"Name"</Label>
                        <Input id="customerName" bind_value=name required=true class="h-8 text-sm" />
                    </div>

                    <div class="flex flex-col gap-1.5">
                        <Label html_for="customerPhone" class="text-xs">"Phone"</Label>
                        <Input id="customerPhone" bind_value=phone class="h-8 text-sm" />
                    </div>

                    <div class="flex flex-col gap-1.5">
                        <Label html_for="customerCpf" class="text-xs">"CPF"</Label>
                        <Input id="customerCpf" bind_value=cpf class="h-8 text-sm" />
                    </div>

                    <AddressGroup label="Default address" signals=default_addr open=open_default />
                    <AddressGroup label="Alternate address" signals=alternate_addr open=open_alternate />
                    <AddressGroup label="Shipping address" signals=shipping_addr open=open_shipping />
                    <AddressGroup label="Billing address" signals=billing_addr open=open_billing />

                    <Show when=move || error.get().is_some() fallback=|| ().into_view()>
                        {move || error.get().map(|e| view! {
                            <Alert class="border-destructive/30">
                                <AlertDescription class="text-destructive text-xs">{e}</AlertDescription>
                            </Alert>
                        })}
                    </Show>

                    <div class="flex items-center gap-2 pt-1">
                        <Button size=ButtonSize::Sm attr:disabled=move || saving.get()>
                            <span class="inline-flex items-center gap-2">
                                <Show when=move || saving.get() fallback=|| ().into_view()>
                                    <Spinner />
                                </Show>
                                {move || {
                                    if saving.get() {
                                        "Saving..."
                                    } else if editing.get().is_some() {
                                        "Save"
                                    } else {
                                        "Create"
                                    }
                                }}
                            </span>
                        </Button>

                        <Show when=move || editing.get().is_some() fallback=|| ().into_view()>
                            <Button
                                variant=ButtonVariant::Destructive
                                size=ButtonSize::Sm
                                attr:r#type="button"
                                attr:disabled=move || saving.get()
                                on:click=move |_| confirm_delete.set(true)
                            >
                                "Remove"
                            </Button>
                            <Button
                                variant=ButtonVariant::Outline
                                size=ButtonSize::Sm
                                attr:r#type="button"
                                attr:disabled=move || saving.get()
                                on:click=move |_| editing.set(None)
                            >
                                "Cancel"
                            </Button>
                        </Show>
                    </div>
                </form>
            </CardContent>
        </Card>

        <Show when=move || confirm_delete.get() fallback=|| ().into_view()>
            <div class="fixed inset-0 z-50 flex items-center justify-center bg-black/30 px-4">
                <div class="w-full max-w-sm rounded-md border border-border bg-background p-4 shadow-lg">
                    <div class="mb-3 space-y-1">
                        <div class="text-sm font-medium text-destructive">"Remove customer"</div>
                        <div class="text-xs text-muted-foreground">
                            {move || {
                                let name = editing
                                    .get()
                                    .map(|c| c.name)
                                    .unwrap_or_default();
                                format!("\"{name}\" will be permanently removed.")
                            }}
                        </div>
                    </div>

                    <div class="flex items-center justify-end gap-2 pt-2">
                        <Button
                            variant=ButtonVariant::Outline
                            size=ButtonSize::Sm
                            attr:disabled=move || saving.get()
                            on:click=move |_| confirm_delete.set(false)
                        >
                            "Cancel"
                        </Button>
                        <Button
                            variant=ButtonVariant::Destructive
                            size=ButtonSize::Sm
                            attr:disabled=move || saving.get()
                            on:click=on_delete_confirmed
                        >
                            "Remove"
                        </Button>
                    </div>
                </div>
            </div>
        </Show>
    }
}

#[component]
fn ProductsView() -> impl IntoView {
    let ui = expect_context::<ConsoleUi>();
    let editing: RwSignal<Option<Product>> = RwSignal::new(None);

    let viewport_width = ui.viewport_width;
    let pane_focus = ui.pane_focus;
    let panel = move || panel_state(viewport_width.get(), pane_focus.get());

    view! {
        <div class=move || panel().container_class()>
            <section class=move || panel().list_class()>
                <ProductList editing=editing />
            </section>

            <section
                class=move || panel().form_class()
                on:focusin=move |_| pane_focus.set(PaneFocus::Form)
                on:focusout=move |_| pane_focus.set(PaneFocus::Neither)
            >
                <ProductForm editing=editing />
            </section>
        </div>
    }
}

#[component]
fn ProductList(editing: RwSignal<Option<Product>>) -> impl IntoView {
    let ui = expect_context::<ConsoleUi>();
    let products = ui.products;
    let loading = ui.loading;
    let load_error = ui.load_error;

    view! {
        <Card>
            <CardHeader>
                <CardTitle class="text-base">"Products"</CardTitle>
                <CardDescription class="text-xs">
                    {move || format!("{} total", products.get().len())}
                </CardDescription>
            </CardHeader>

            <CardContent class="flex flex-col gap-2">
                <Show when=move || load_error.get().is_some() fallback=|| ().into_view()>
                    {move || load_error.get().map(|e| view! {
                        <Alert class="border-destructive/30">
                            <AlertDescription class="text-destructive text-xs">{e}</AlertDescription>
                        </Alert>
                    })}
                </Show>

                <Show when=move || loading.get() fallback=|| ().into_view()>
                    <div class="text-xs text-muted-foreground">"Loading..."</div>
                </Show>

                <Show
                    when=move || !loading.get() && products.get().is_empty()
                    fallback=|| ().into_view()
                >
                    <div class="text-sm text-muted-foreground">"No products yet."</div>
                </Show>

                {move || {
                    products
                        .get()
                        .into_iter()
                        .map(|p| {
                            let name = display_or_dash(&p.name);
                            let subtitle = format!(
                                "SKU {} • {} • stock: {}",
                                display_or_dash(&p.sku),
                                format_brl(p.price_cents),
                                p.stock
                            );
                            let row = p.clone();

                            view! {
                                <div class="flex items-center justify-between gap-2 rounded-md border px-3 py-2">
                                    <div class="min-w-0">
                                        <div class="truncate text-sm font-medium">{name}</div>
                                        <div class="truncate text-xs text-muted-foreground">{subtitle}</div>
                                    </div>
                                    <Button
                                        variant=ButtonVariant::Outline
                                        size=ButtonSize::Sm
                                        on:click=move |_| editing.set(Some(row.clone()))
                                    >
                                        "Edit"
                                    </Button>
                                </div>
                            }
                            .into_any()
                        })
                        .collect_view()
                }}
            </CardContent>
        </Card>
    }
}

#[component]
fn ProductForm(editing: RwSignal<Option<Product>>) -> impl IntoView {
    let ui = expect_context::<ConsoleUi>();
    let app_state = expect_context::<AppContext>();
    let controller = ui.controller;

    let sku = RwSignal::new(String::new());
    let ean = RwSignal::new(String::new());
    let name = RwSignal::new(String::new());
    let description = RwSignal::new(String::new());
    let price_text = RwSignal::new(String::new());
    let stock_text = RwSignal::new(String::new());
    let unit = RwSignal::new(String::new());
    let images_text = RwSignal::new(String::new());
    let categories_text = RwSignal::new(String::new());
    let available_online = RwSignal::new(false);
    let whatsapp_catalog_id = RwSignal::new(String::new());
    let visibility = RwSignal::new(String::new());
    let active = RwSignal::new(true);
    let weight_text = RwSignal::new(String::new());
    let brand = RwSignal::new(String::new());

    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let saving = RwSignal::new(false);
    let confirm_delete = RwSignal::new(false);

    let clear_form = move || {
        sku.set(String::new());
        ean.set(String::new());
        name.set(String::new());
        description.set(String::new());
        price_text.set(String::new());
        stock_text.set(String::new());
        unit.set(String::new());
        images_text.set(String::new());
        categories_text.set(String::new());
        available_online.set(false);
        whatsapp_catalog_id.set(String::new());
        visibility.set(String::new());
        active.set(true);
        weight_text.set(String::new());
        brand.set(String::new());
        error.set(None);
    };

    Effect::new(move |_| match editing.get() {
        Some(p) => {
            sku.set(p.sku.clone());
            ean.set(p.ean.clone());
            name.set(p.name.clone());
            description.set(p.description.clone());
            price_text.set(p.price_cents.to_string());
            stock_text.set(p.stock.to_string());
            unit.set(p.unit.clone());
            images_text.set(p.images.join(", "));
            categories_text.set(p.categories.join(", "));
            available_online.set(p.available_online);
            whatsapp_catalog_id.set(p.whatsapp_catalog_id.clone());
            visibility.set(p.visibility.clone());
            active.set(p.active);
            weight_text.set(p.meta.weight_grams.to_string());
            brand.set(p.meta.brand.clone());
            error.set(None);
        }
        None => clear_form(),
    });

    let draft_from_form = move || {
        Draft::Product(ProductDraft {
            sku: sku.get_untracked(),
            ean: ean.get_untracked(),
            name: name.get_untracked(),
            description: description.get_untracked(),
            price_cents: parse_i64_or_zero(&price_text.get_untracked()),
            stock: parse_i64_or_zero(&stock_text.get_untracked()),
            unit: unit.get_untracked(),
            images_text: images_text.get_untracked(),
            categories_text: categories_text.get_untracked(),
            available_online: available_online.get_untracked(),
            whatsapp_catalog_id: whatsapp_catalog_id.get_untracked(),
            visibility: visibility.get_untracked(),
            active: active.get_untracked(),
            weight_grams: parse_i64_or_zero(&weight_text.get_untracked()),
            brand: brand.get_untracked(),
        })
    };

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if saving.get_untracked() {
            return;
        }

        let draft = draft_from_form();
        let gateway = app_state.gateway();
        let path = controller.with_value(|c| c.collection_path(View::Products));
        let current = editing.get_untracked();

        saving.set(true);
        error.set(None);

        spawn_local(async move {
            let outcome = match &current {
                Some(p) => gateway.update(&path, &p.id, &draft).await,
                None => gateway
                    .create(&path, &draft, IdPolicy::TimestampTagged)
                    .await
                    .map(|_| ()),
            };

            match outcome {
                Ok(()) => {
                    if current.is_some() {
                        editing.set(None);
                    } else {
                        clear_form();
                    }
                }
                Err(err) => {
                    error.set(Some(err.to_string()));
                }
            }
            saving.set(false);
        });
    };

    let on_delete_confirmed = move |_| {
        let Some(current) = editing.get_untracked() else {
            return;
        };
        let gateway = app_state.gateway();
        let path = controller.with_value(|c| c.collection_path(View::Products));

        saving.set(true);
        error.set(None);

        spawn_local(async move {
            match gateway.delete(&path, &current.id).await {
                Ok(()) => {
                    confirm_delete.set(false);
                    editing.set(None);
                }
                Err(err) => {
                    confirm_delete.set(false);
                    error.set(Some(err.to_string()));
                }
            }
            saving.set(false);
        });
    };

    view! {
        <Card>
            <CardHeader>
                <CardTitle class="text-base">
                    {move || if editing.get().is_some() { "Edit product" } else { "New product" }}
                </CardTitle>
            </CardHeader>

            <CardContent>
                <form class="flex flex-col gap-3" on:submit=on_submit>
                    <div class="grid gap-3 sm:grid-cols-2">
                        <div class="flex flex-col gap-1.5">
                            <Label html_for="productSku" class="text-xs">"SKU"</Label>
                            <Input id="productSku" bind_value=sku class="h-8 text-sm" />
                        </div>
                        <div class="flex flex-col gap-1.5">
                            <Label html_for="productEan" class="text-xs">"EAN"</Label>
                            <Input id="productEan" bind_value=ean class="h-8 text-sm" />
                        </div>
                    </div>

                    <div class="flex flex-col gap-1.5">
                        <Label html_for="productName" class="text-xs">"Name"</Label>
                        <Input id="productName" bind_value=name required=true class="h-8 text-sm" />
                    </div>

                    <div class="flex flex-col gap-1.5">
                        <Label html_for="productDescription" class="text-xs">"Description"</Label>
                        <Textarea id="productDescription" bind_value=description class="text-sm" />
                    </div>

                    <div class="grid gap-3 sm:grid-cols-3">
                        <div class="flex flex-col gap-1.5">
                            <Label html_for="productPrice" class="text-xs">"Price (cents)"</Label>
                            <Input id="productPrice" r#type="number" bind_value=price_text class="h-8 text-sm" />
                        </div>
                        <div class="flex flex-col gap-1.5">
                            <Label html_for="productStock" class="text-xs">"Stock"</Label>
                            <Input id="productStock" r#type="number" bind_value=stock_text class="h-8 text-sm" />
                        </div>
                        <div class="flex flex-col gap-1.5">
                            <Label html_for="productUnit" class="text-xs">"Unit"</Label>
                            <Input id="productUnit" bind_value=unit placeholder="un, kg, pct" class="h-8 text-sm" />
                        </div>
                    </div>

                    <div class="flex flex-col gap-1.5">
                        <Label html_for="productImages" class="text-xs">"Images (comma-separated URLs)"</Label>
                        <Input id="productImages" bind_value=images_text placeholder="a.jpg, b.jpg" class="h-8 text-sm" />
                    </div>

                    <div class="flex flex-col gap-1.5">
                        <Label html_for="productCategories" class="text-xs">"Categories (comma-separated)"</Label>
                        <Input id="productCategories" bind_value=categories_text class="h-8 text-sm" />
                    </div>

                    <div class="grid gap-3 sm:grid-cols-2">
                        <div class="flex flex-col gap-1.5">
                            <Label html_for="productVisibility" class="text-xs">"Visibility"</Label>
                            <Input id="productVisibility" bind_value=visibility placeholder="public/private" class="h-8 text-sm" />
                        </div>
                        <div class="flex flex-col gap-1.5">
                            <Label html_for="productWhatsapp" class="text-xs">"WhatsApp catalog id"</Label>
                            <Input id="productWhatsapp" bind_value=whatsapp_catalog_id class="h-8 text-sm" />
                        </div>
                    </div>

                    <div class="grid gap-3 sm:grid-cols-2">
                        <div class="flex flex-col gap-1.5">
                            <Label html_for="productWeight" class="text-xs">"Weight (grams)"</Label>
                            <Input id="productWeight" r#type="number" bind_value=weight_text class="h-8 text-sm" />
                        </div>
                        <div class="flex flex-col gap-1.5">
                            <Label html_for="productBrand" class="text-xs">"Brand"</Label>
                            <Input id="productBrand" bind_value=brand class="h-8 text-sm" />
                        </div>
                    </div>

                    <div class="flex items-center gap-4 pt-1">
                        <div class="flex items-center gap-2">
                            <Checkbox id="productAvailableOnline" bind_value=available_online />
                            <Label html_for="productAvailableOnline" class="text-xs">"Available online"</Label>
                        </div>
                        <div class="flex items-center gap-2">
                            <Checkbox id="productActive" bind_value=active />
                            <Label html_for="productActive" class="text-xs">"Active"</Label>
                        </div>
                    </div>

                    <Show when=move || error.get().is_some() fallback=|| ().into_view()>
                        {move || error.get().map(|e| view! {
                            <Alert class="border-destructive/30">
                                <AlertDescription class="text-destructive text-xs">{e}</AlertDescription>
                            </Alert>
                        })}
                    </Show>

                    <div class="flex items-center gap-2 pt-1">
                        <Button size=ButtonSize::Sm attr:disabled=move || saving.get()>
                            <span class="inline-flex items-center gap-2">
                                <Show when=move || saving.get() fallback=|| ().into_view()>
                                    <Spinner />
                                </Show>
                                {move || {
                                    if saving.get() {
                                        "Saving..."
                                    } else if editing.get().is_some() {
                                        "Save"
                                    } else {
                                        "Create"
                                    }
                                }}
                            </span>
                        </Button>

                        <Show when=move || editing.get().is_some() fallback=|| ().into_view()>
                            <Button
                                variant=ButtonVariant::Destructive
                                size=ButtonSize::Sm
                                attr:r#type="button"
                                attr:disabled=move || saving.get()
                                on:click=move |_| confirm_delete.set(true)
                            >
                                "Remove"
                            </Button>
                            <Button
                                variant=ButtonVariant::Outline
                                size=ButtonSize::Sm
                                attr:r#type="button"
                                attr:disabled=move || saving.get()
                                on:click=move |_| editing.set(None)
                            >
                                "Cancel"
                            </Button>
                        </Show>
                    </div>
                </form>
            </CardContent>
        </Card>

        <Show when=move || confirm_delete.get() fallback=|| ().into_view()>
            <div class="fixed inset-0 z-50 flex items-center justify-center bg-black/30 px-4">
                <div class="w-full max-w-sm rounded-md border border-border bg-background p-4 shadow-lg">
                    <div class="mb-3 space-y-1">
                        <div class="text-sm font-medium text-destructive">"Remove product"</div>
                        <div class="text-xs text-muted-foreground">
                            {move || {
                                let name = editing.get().map(|p| p.name).unwrap_or_default();
                                format!("\"{name}\" will be permanently removed.")
                            }}
                        </div>
                    </div>

                    <div class="flex items-center justify-end gap-2 pt-2">
                        <Button
                            variant=ButtonVariant::Outline
                            size=ButtonSize::Sm
                            attr:disabled=move || saving.get()
                            on:click=move |_| confirm_delete.set(false)
                        >
                            "Cancel"
                        </Button>
                        <Button
                            variant=ButtonVariant::Destructive
                            size=ButtonSize::Sm
                            attr:disabled=move || saving.get()
                            on:click=on_delete_confirmed
                        >
                            "Remove"
                        </Button>
                    </div>
                </div>
            </div>
        </Show>
    }
}

#[component]
fn OrdersView() -> impl IntoView {
    let ui = expect_context::<ConsoleUi>();
    let orders = ui.orders;
    let loading = ui.loading;
    let load_error = ui.load_error;

    view! {
        <div class="space-y-3">
            <Show when=move || load_error.get().is_some() fallback=|| ().into_view()>
                {move || load_error.get().map(|e| view! {
                    <Alert class="border-destructive/30">
                        <AlertDescription class="text-destructive text-xs">{e}</AlertDescription>
                    </Alert>
                })}
            </Show>

            <Show when=move || loading.get() fallback=|| ().into_view()>
                <div class="text-xs text-muted-foreground">"Loading..."</div>
            </Show>

            <Show
                when=move || !loading.get() && load_error.get().is_none() && orders.get().is_empty()
                fallback=|| ().into_view()
            >
                <div class="text-sm text-muted-foreground">"No orders yet."</div>
            </Show>

            <div class="grid gap-3 sm:grid-cols-2">
                {move || {
                    orders
                        .get()
                        .into_iter()
                        .map(|o| {
                            let customer = display_or_dash(&o.customer_id);
                            let status = display_or_dash(&o.status);
                            let total = format_brl(o.total_cents);
                            let created = format_timestamp(o.created_at);

                            view! {
                                <Card class="py-4">
                                    <CardContent class="space-y-1 px-4 text-xs">
                                        <div><span class="font-medium">"Order: "</span>{o.id.clone()}</div>
                                        <div><span class="font-medium">"Customer: "</span>{customer}</div>
                                        <div><span class="font-medium">"Status: "</span>{status}</div>
                                        <div><span class="font-medium">"Total: "</span>{total}</div>
                                        <div><span class="font-medium">"Created: "</span>{created}</div>
                                    </CardContent>
                                </Card>
                            }
                            .into_any()
                        })
                        .collect_view()
                }}
            </div>
        </div>
    }
}

#[component]
fn CartsView() -> impl IntoView {
    let ui = expect_context::<ConsoleUi>();
    let carts = ui.carts;
    let loading = ui.loading;
    let load_error = ui.load_error;

    view! {
        <div class="space-y-3">
            <Show when=move || load_error.get().is_some() fallback=|| ().into_view()>
                {move || load_error.get().map(|e| view! {
                    <Alert class="border-destructive/30">
                        <AlertDescription class="text-destructive text-xs">{e}</AlertDescription>
                    </Alert>
                })}
            </Show>

            <Show when=move || loading.get() fallback=|| ().into_view()>
                <div class="text-xs text-muted-foreground">"Loading..."</div>
            </Show>

            <Show
                when=move || !loading.get() && load_error.get().is_none() && carts.get().is_empty()
                fallback=|| ().into_view()
            >
                <div class="text-sm text-muted-foreground">"No carts yet."</div>
            </Show>

            <div class="grid gap-3 sm:grid-cols-2">
                {move || {
                    carts
                        .get()
                        .into_iter()
                        .map(|c| {
                            let customer = display_or_dash(&c.customer_id);
                            let status = display_or_dash(&c.status);
                            let created = format_timestamp(c.created_at);

                            view! {
                                <Card class="py-4">
                                    <CardContent class="space-y-1 px-4 text-xs">
                                        <div><span class="font-medium">"Cart: "</span>{c.id.clone()}</div>
                                        <div><span class="font-medium">"Customer: "</span>{customer}</div>
                                        <div><span class="font-medium">"Status: "</span>{status}</div>
                                        <div><span class="font-medium">"Created: "</span>{created}</div>
                                    </CardContent>
                                </Card>
                            }
                            .into_any()
                        })
                        .collect_view()
                }}
            </div>
        </div>
    }
}

fn display_or_dash(s: &str) -> String {
    if s.trim().is_empty() {
        "—".to_string()
    } else {
        s.to_string()
    }
}
