//! Instruction prompt and response schema sent with every analysis

use serde_json::{json, Value};

/// Build the instruction text, embedding the user's notes
pub fn analysis_prompt(notes: &str) -> String {
    format!(
        "Анализирай тези снимки на храна с професионална точност.\n\
         Бележки от потребителя: \"{}\".\n\n\
         Инструкции:\n\
         1. Цялата информация да е на БЪЛГАРСКИ ЕЗИК.\n\
         2. Изчисли теглото и макросите за ВСЕКИ продукт поотделно.\n\
         3. Бъди изключително прецизен с порциите, базирайки се на чинията и околната среда.\n\
         4. Не завишавай калориите излишно, ако ястието изглежда леко.\n\
         5. Ако има дресинг, оцени го като отделен елемент в списъка съставки.",
        notes.trim()
    )
}

/// JSON schema the service must fill in
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "totalCalories": { "type": "NUMBER", "description": "Общо калории (kcal)" },
            "totalWeight": { "type": "STRING", "description": "Общо тегло (напр. 450г)" },
            "protein": { "type": "NUMBER", "description": "Общо протеини (г)" },
            "carbs": { "type": "NUMBER", "description": "Общо въглехидрати (г)" },
            "fat": { "type": "NUMBER", "description": "Общо мазнини (г)" },
            "ingredients": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING", "description": "Име на продукта на български" },
                        "weightValue": { "type": "NUMBER", "description": "Числена стойност в грамове за този продукт" },
                        "calories": { "type": "NUMBER", "description": "Калории за това количество" },
                        "protein": { "type": "NUMBER", "description": "Протеини (г)" },
                        "carbs": { "type": "NUMBER", "description": "Въглехидрати (г)" },
                        "fat": { "type": "NUMBER", "description": "Мазнини (г)" }
                    },
                    "required": ["name", "weightValue", "calories", "protein", "carbs", "fat"]
                }
            },
            "explanation": { "type": "STRING", "description": "Обяснение на български" }
        },
        "required": ["totalCalories", "totalWeight", "protein", "carbs", "fat", "ingredients", "explanation"]
    })
}
